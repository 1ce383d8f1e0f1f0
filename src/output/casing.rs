//! Identifier casing for generated code
//!
//! The engine reports names exactly as the server does (`typname`, column
//! labels, directive names); this is the one place they get recased into
//! Rust conventions.

use convert_case::{Case, Casing};

/// `department_id` → `DepartmentId`, for type and variant names.
pub fn pascal(name: &str) -> String {
    name.to_case(Case::Pascal)
}

/// `GetUserByID` or `created at` → `get_user_by_id` / `created_at`, for
/// method and field names.
pub fn snake(name: &str) -> String {
    name.to_case(Case::Snake)
}

//! Code printers
//!
//! Turn the resolved query IR into host-language source text. The engine
//! produces names and types verbatim from the server; everything
//! language-flavored (identifier casing, null wrapping, type spelling)
//! lives here.

pub mod casing;
pub mod rust;

use thiserror::Error;

use crate::engine::ir::ResolvedQueries;

pub use rust::RustPrinter;

#[derive(Debug, Error)]
pub enum PrintError {
    #[error("no Rust type mapping for '{0}' (add an [overrides] entry)")]
    UnmappedType(String),
}

/// The three generated source files, as text. File placement is the
/// pipeline's concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    /// `database.rs`: the `Store` wrapper around the connection.
    pub database: String,
    /// `models.rs`: shared type definitions (enums).
    pub models: String,
    /// `queries.rs`: one method per query plus its row structs.
    pub queries: String,
}

/// A code printer for one host language.
pub trait Printer {
    fn print(&self, resolved: &ResolvedQueries) -> Result<Rendered, PrintError>;
}

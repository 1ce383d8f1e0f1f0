//! Query annotation parsing
//!
//! Queries carry their metadata as SQL comments, line by line:
//!
//! ```sql
//! -- :one
//! -- $1: id
//! select * from users where id = $1 limit 1
//! ```
//!
//! `-- :one` / `-- :many` / `-- :exec` picks the execution shape and
//! `-- $N: name` names the Nth placeholder. Anything else is ignored, so
//! ordinary comments and the SQL itself pass through untouched.

use std::collections::HashMap;

use crate::engine::ir::QueryShape;

/// Extract the execution shape directive. The first recognized directive
/// wins; a query without one defaults to [`QueryShape::Many`]. Directive
/// lines take no arguments, so trailing text disqualifies the line.
pub fn parse_shape(sql: &str) -> QueryShape {
    for line in sql.lines() {
        if let Some(token) = line.trim_start().strip_prefix("-- :")
            && let Ok(shape) = token.parse::<QueryShape>()
        {
            return shape;
        }
    }

    QueryShape::Many
}

/// Extract `-- $N: name` parameter-name directives into an `N → name`
/// mapping. `N` is kept as the verbatim string between `$` and `:`; both
/// ends are trimmed. A later directive for the same `N` overwrites an
/// earlier one.
pub fn parse_param_names(sql: &str) -> HashMap<String, String> {
    let mut names = HashMap::new();

    for line in sql.lines() {
        let Some(rest) = line.trim_start().strip_prefix("-- $") else {
            continue;
        };
        let Some((index, name)) = rest.split_once(':') else {
            continue;
        };

        names.insert(index.trim().to_string(), name.trim().to_string());
    }

    names
}

//! Query collection from disk
//!
//! Maps a directory of `*.sql` files to the `(name → sql)` set the engine
//! compiles. The file stem is the query name; the file body is the query.

pub mod sql;

use std::path::PathBuf;

use thiserror::Error;

pub use sql::SqlLoader;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

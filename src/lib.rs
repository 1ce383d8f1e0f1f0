//! pg-typegen: typed data-access code generation for PostgreSQL
//!
//! This library compiles a directory of annotated SQL query files into a
//! strongly typed Rust data-access layer. It prepares each query on a live
//! connection to learn parameter and result OIDs, reads the server's
//! EXPLAIN plan to decide nullability of every placeholder and output
//! column, resolves OIDs through the catalog, and prints tokio-postgres
//! code from the result.

pub mod config;
pub mod engine;
pub mod input;
pub mod output;
pub mod parser;
pub mod pipeline;

// Re-export commonly used types
pub use config::Config;
pub use engine::ir::{PgType, Query, QueryShape, ResolvedQueries, TypeKind};
pub use engine::{Engine, EngineError};
pub use output::RustPrinter;
pub use pipeline::Pipeline;

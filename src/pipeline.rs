//! Codegen pipeline: collect, resolve, print, write.
//!
//! The [`Pipeline`] struct owns one engine/printer pair and runs a single
//! store end to end: load the query files, resolve them against the live
//! schema, render the generated sources, and place them in the output
//! directory.

use std::path::{Path, PathBuf};

use log::info;
use thiserror::Error;

use crate::engine::{Engine, EngineError};
use crate::input::{LoadError, SqlLoader};
use crate::output::{PrintError, Printer, Rendered};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("collect queries: {0}")]
    Load(#[from] LoadError),

    #[error("resolve queries: {0}")]
    Engine(#[from] EngineError),

    #[error("print queries: {0}")]
    Print(#[from] PrintError),

    #[error("write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Runs one store through the full generation sequence.
pub struct Pipeline<P> {
    engine: Engine,
    printer: P,
}

impl<P: Printer> Pipeline<P> {
    pub fn new(engine: Engine, printer: P) -> Self {
        Self { engine, printer }
    }

    /// Compile every query under `queries_dir` and write the generated
    /// sources into `out_dir` (created if missing). The first failure at
    /// any step aborts the run with nothing partially written.
    pub async fn run(&self, queries_dir: &Path, out_dir: &Path) -> Result<(), PipelineError> {
        let queries = SqlLoader::new().load(queries_dir)?;
        info!(
            "collected {} queries from {}",
            queries.len(),
            queries_dir.display()
        );

        let resolved = self.engine.resolve_queries(&queries).await?;
        let rendered = self.printer.print(&resolved)?;

        write_rendered(out_dir, &rendered)?;
        info!("wrote generated code to {}", out_dir.display());

        Ok(())
    }
}

/// Place the three generated files in `out_dir`.
pub(crate) fn write_rendered(out_dir: &Path, rendered: &Rendered) -> Result<(), PipelineError> {
    std::fs::create_dir_all(out_dir).map_err(|source| PipelineError::Write {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let files = [
        ("database.rs", &rendered.database),
        ("models.rs", &rendered.models),
        ("queries.rs", &rendered.queries),
    ];

    for (file, contents) in files {
        let path = out_dir.join(file);
        std::fs::write(&path, contents).map_err(|source| PipelineError::Write {
            path: path.clone(),
            source,
        })?;
    }

    Ok(())
}

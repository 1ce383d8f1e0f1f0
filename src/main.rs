//! pg-typegen CLI
//!
//! Entry point for the command-line tool.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio_postgres::NoTls;

use pg_typegen::engine::Engine;
use pg_typegen::output::RustPrinter;
use pg_typegen::pipeline::Pipeline;

#[derive(Parser, Debug)]
#[command(name = "pg-typegen")]
#[command(version)]
#[command(about = "Compile annotated SQL queries into typed Rust data-access code", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "pg-typegen.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = pg_typegen::Config::from_file(&args.config)
        .with_context(|| format!("Failed to load configuration from {}", args.config.display()))?;

    for store in &config.stores {
        let (client, connection) = tokio_postgres::connect(&store.database, NoTls)
            .await
            .context("Failed to connect to database")?;

        // The connection drives the socket until the client is dropped.
        tokio::spawn(async move {
            if let Err(err) = connection.await {
                log::error!("database connection error: {err}");
            }
        });

        let engine = Engine::new(client);
        let printer = RustPrinter::new(config.overrides.clone());

        Pipeline::new(engine, printer)
            .run(&store.queries, &store.output)
            .await
            .with_context(|| {
                format!("Failed to generate code for queries in {}", store.queries.display())
            })?;
    }

    Ok(())
}

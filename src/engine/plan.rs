//! Plan ingestion
//!
//! Runs `EXPLAIN (format json, verbose, generic_plan)` over the raw simple
//! query protocol and decodes the single-rooted plan tree. `verbose` is what
//! puts the `Output` expression strings on every node; `generic_plan` lets
//! EXPLAIN accept parameterized statements without bound values.

use serde::Deserialize;
use thiserror::Error;
use tokio_postgres::{Client, SimpleQueryMessage};

#[derive(Debug, Error)]
pub enum ExplainError {
    #[error("execute explain query: {0}")]
    Execute(#[from] tokio_postgres::Error),

    #[error("unexpected result set count: {0}")]
    ResultSetCount(usize),

    #[error("unexpected row count: {0}")]
    RowCount(usize),

    #[error("unexpected column count: {0}")]
    ColumnCount(usize),

    #[error("decode plan json: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("unexpected plan entry count: {0}")]
    EntryCount(usize),
}

/// One node of the server's plan tree, as echoed by EXPLAIN.
///
/// This is the wire shape: a wide record where most fields only apply to
/// some node types. The nullability analyzer classifies `node_type` before
/// reading anything else, so absent fields stay absent here instead of
/// leaking defaults into the analysis.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PlanNode {
    #[serde(rename = "Node Type")]
    pub node_type: String,

    /// Set on `ModifyTable` nodes: "Insert", "Update", "Delete".
    #[serde(rename = "Operation", default)]
    pub operation: Option<String>,

    #[serde(rename = "Join Type", default)]
    pub join_type: Option<String>,

    #[serde(rename = "Plans", default)]
    pub plans: Vec<PlanNode>,

    /// Output expression strings, verbatim. These are the keys the
    /// nullability maps use; they must not be normalized.
    #[serde(rename = "Output", default)]
    pub output: Vec<String>,

    /// Relation alias on scan nodes; output expressions are prefixed with it.
    #[serde(rename = "Alias", default)]
    pub alias: Option<String>,

    #[serde(rename = "Schema", default)]
    pub schema: Option<String>,

    #[serde(rename = "Relation Name", default)]
    pub relation: Option<String>,

    /// Planner row estimate. Zero means the statement produces no rows
    /// (e.g. INSERT without RETURNING).
    #[serde(rename = "Plan Rows", default)]
    pub plan_rows: u64,
}

#[derive(Debug, Deserialize)]
struct ExplainEntry {
    #[serde(rename = "Plan")]
    plan: PlanNode,
}

/// Run EXPLAIN over `sql` and return the root plan node.
pub(crate) async fn explain_query(client: &Client, sql: &str) -> Result<PlanNode, ExplainError> {
    let explain_sql = format!("explain (format json, verbose, generic_plan) {sql}");

    let messages = client.simple_query(&explain_sql).await?;

    let mut result_sets = 0usize;
    let mut rows = Vec::new();
    for message in messages {
        match message {
            SimpleQueryMessage::Row(row) => rows.push(row),
            SimpleQueryMessage::CommandComplete(_) => result_sets += 1,
            _ => {}
        }
    }

    if result_sets != 1 {
        return Err(ExplainError::ResultSetCount(result_sets));
    }
    if rows.len() != 1 {
        return Err(ExplainError::RowCount(rows.len()));
    }
    let row = &rows[0];
    if row.len() != 1 {
        return Err(ExplainError::ColumnCount(row.len()));
    }

    decode_plan(row.get(0).unwrap_or(""))
}

/// Decode the JSON payload: a single-element array whose entry carries the
/// root under a `Plan` key. Everything else EXPLAIN attaches is discarded.
pub(crate) fn decode_plan(payload: &str) -> Result<PlanNode, ExplainError> {
    let mut entries: Vec<ExplainEntry> = serde_json::from_str(payload)?;

    match entries.len() {
        1 => Ok(entries.remove(0).plan),
        n => Err(ExplainError::EntryCount(n)),
    }
}

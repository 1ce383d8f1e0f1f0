//! Nullability analysis
//!
//! Walks the EXPLAIN plan tree and derives, for one query, which input
//! placeholders and which output expressions can produce SQL NULL. This is
//! deliberately not what the catalog reports: `pg_type.typnotnull` describes
//! a column in its base relation, not the expression that survives an outer
//! join or feeds an INSERT into a nullable column.
//!
//! Maps are keyed by the expression strings exactly as the server echoes
//! them in each node's `Output` (e.g. `"e.id"`, `"$1"`); parents read the
//! keys they care about from their children.

use std::collections::HashMap;

use thiserror::Error;

use super::catalog::{Catalog, CatalogError};
use super::plan::PlanNode;

#[derive(Debug, Error)]
pub enum NullabilityError {
    #[error("unsupported node type: {0}")]
    UnsupportedNode(String),

    #[error("unsupported join type: {0}")]
    UnsupportedJoin(String),

    #[error("node '{0}' has no child plan")]
    MissingChild(String),

    #[error("compute output '{output}' nullability: {source}")]
    Column {
        output: String,
        #[source]
        source: CatalogError,
    },

    #[error("compute relation '{relation}' nullability: {source}")]
    Relation {
        relation: String,
        #[source]
        source: CatalogError,
    },
}

/// Per-query analysis result: placeholder name → nullable and output
/// expression → nullable. Expressions absent from a map are non-nullable.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct NullabilityMaps {
    pub inputs: HashMap<String, bool>,
    pub outputs: HashMap<String, bool>,
}

/// The plan vocabulary the analyzer understands. Classification happens at
/// walk time so that exotic nodes the walk never reaches (e.g. an InitPlan
/// hanging off a `Result`) do not fail the query.
enum NodeKind {
    Result,
    Passthrough,
    ModifyTable,
    Scan,
    Join,
}

fn classify(node_type: &str) -> Result<NodeKind, NullabilityError> {
    match node_type {
        "Result" => Ok(NodeKind::Result),
        "Hash" | "Limit" | "Sort" | "Materialize" => Ok(NodeKind::Passthrough),
        "ModifyTable" => Ok(NodeKind::ModifyTable),
        "Seq Scan" | "Index Scan" | "Index Only Scan" => Ok(NodeKind::Scan),
        "Hash Join" | "Merge Join" | "Nested Loop" => Ok(NodeKind::Join),
        other => Err(NullabilityError::UnsupportedNode(other.to_string())),
    }
}

/// Walk the plan rooted at `plan` and compute its nullability maps.
pub(crate) async fn analyze(
    catalog: &dyn Catalog,
    plan: &PlanNode,
) -> Result<NullabilityMaps, NullabilityError> {
    match classify(&plan.node_type)? {
        NodeKind::Result => Ok(NullabilityMaps::default()),
        NodeKind::Passthrough => Box::pin(analyze(catalog, first_child(plan)?)).await,
        NodeKind::ModifyTable => analyze_modify_table(catalog, plan).await,
        NodeKind::Scan => analyze_scan(catalog, plan).await,
        NodeKind::Join => analyze_join(catalog, plan).await,
    }
}

fn first_child(plan: &PlanNode) -> Result<&PlanNode, NullabilityError> {
    plan.plans
        .first()
        .ok_or_else(|| NullabilityError::MissingChild(plan.node_type.clone()))
}

/// Scan leaves: every output expression is `alias.column`; strip the alias
/// and ask the catalog for the column's declared nullability. A miss means
/// the expression is not a real column (a literal, a computed value) and
/// reads as non-nullable.
async fn analyze_scan(
    catalog: &dyn Catalog,
    plan: &PlanNode,
) -> Result<NullabilityMaps, NullabilityError> {
    let schema = plan.schema.as_deref().unwrap_or("");
    let relation = plan.relation.as_deref().unwrap_or("");
    let prefix = plan
        .alias
        .as_deref()
        .map(|alias| format!("{alias}."))
        .unwrap_or_default();

    let mut outputs = HashMap::new();
    for expr in &plan.output {
        let column = expr.strip_prefix(&prefix).unwrap_or(expr);

        let nullable = catalog
            .column_nullability(schema, relation, column)
            .await
            .map_err(|source| NullabilityError::Column {
                output: expr.clone(),
                source,
            })?
            .unwrap_or(false);

        outputs.insert(expr.clone(), nullable);
    }

    Ok(NullabilityMaps {
        inputs: HashMap::new(),
        outputs,
    })
}

/// ModifyTable recurses into the plan feeding the write. For the plain
/// `INSERT ... VALUES (literals)` shape, an Insert whose child is a bare
/// `Result`, each child output expression that lands in a nullable column
/// of the target relation is a nullable input: the caller may pass NULL for
/// that placeholder.
async fn analyze_modify_table(
    catalog: &dyn Catalog,
    plan: &PlanNode,
) -> Result<NullabilityMaps, NullabilityError> {
    let child = first_child(plan)?;
    let mut maps = Box::pin(analyze(catalog, child)).await?;

    if plan.operation.as_deref() == Some("Insert") && child.node_type == "Result" {
        let schema = plan.schema.as_deref().unwrap_or("");
        let relation = plan.relation.as_deref().unwrap_or("");

        let nullability = catalog
            .relation_nullability(schema, relation)
            .await
            .map_err(|source| NullabilityError::Relation {
                relation: relation.to_string(),
                source,
            })?;

        for (idx, expr) in child.output.iter().enumerate() {
            if nullability.get(idx).copied().unwrap_or(false) {
                maps.inputs.insert(expr.clone(), true);
            }
        }
    }

    Ok(maps)
}

/// Joins start from "every join output is non-nullable", then overlay the
/// children according to the join type: an outer join forces the inner
/// side's columns nullable, while the preserved side keeps whatever its
/// child reported. Expressions neither child reports (computed values)
/// stay non-nullable.
async fn analyze_join(
    catalog: &dyn Catalog,
    plan: &PlanNode,
) -> Result<NullabilityMaps, NullabilityError> {
    if plan.plans.len() < 2 {
        return Err(NullabilityError::MissingChild(plan.node_type.clone()));
    }

    let mut outputs: HashMap<String, bool> =
        plan.output.iter().map(|expr| (expr.clone(), false)).collect();

    let lhs = Box::pin(analyze(catalog, &plan.plans[0])).await?;
    let rhs = Box::pin(analyze(catalog, &plan.plans[1])).await?;

    match plan.join_type.as_deref().unwrap_or("") {
        "Inner" => {
            for (expr, nullable) in lhs.outputs.iter().chain(rhs.outputs.iter()) {
                if let Some(slot) = outputs.get_mut(expr) {
                    *slot = *nullable;
                }
            }
        }

        "Left" => {
            for expr in rhs.outputs.keys() {
                if let Some(slot) = outputs.get_mut(expr) {
                    *slot = true;
                }
            }
            for (expr, nullable) in &lhs.outputs {
                if let Some(slot) = outputs.get_mut(expr) {
                    *slot = *nullable;
                }
            }
        }

        "Right" => {
            for expr in lhs.outputs.keys() {
                if let Some(slot) = outputs.get_mut(expr) {
                    *slot = true;
                }
            }
            for (expr, nullable) in &rhs.outputs {
                if let Some(slot) = outputs.get_mut(expr) {
                    *slot = *nullable;
                }
            }
        }

        other => return Err(NullabilityError::UnsupportedJoin(other.to_string())),
    }

    // Left's placeholder observations win on collision.
    let mut inputs = rhs.inputs;
    inputs.extend(lhs.inputs);

    Ok(NullabilityMaps { inputs, outputs })
}

//! Query compilation engine
//!
//! Orchestrates one compile run: for every named query, prepare the
//! statement (parameter and field OIDs), ingest the EXPLAIN plan, run the
//! nullability analysis, resolve every OID to a type descriptor, and
//! assemble the consolidated [`ResolvedQueries`].
//!
//! Nothing here parses SQL. The server's planner and catalog carry all SQL
//! interpretation; the engine only cross-references what they report.

pub mod catalog;
pub mod ir;
pub mod nullability;
pub mod plan;

#[cfg(test)]
pub(crate) mod test_support;

use std::collections::{BTreeMap, HashMap};

use log::debug;
use thiserror::Error;
use tokio_postgres::Client;

use crate::parser;
use catalog::{Catalog, CatalogError, PgCatalog};
use ir::{Input, Output, PgType, Query, QueryShape, ResolvedQueries, assemble_types};
use nullability::NullabilityError;
use plan::ExplainError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("prepare query '{name}': {source}")]
    Prepare {
        name: String,
        #[source]
        source: tokio_postgres::Error,
    },

    #[error("explain query '{name}': {source}")]
    Explain {
        name: String,
        #[source]
        source: ExplainError,
    },

    #[error("compute nullability for query '{name}': {source}")]
    Nullability {
        name: String,
        #[source]
        source: NullabilityError,
    },

    #[error("resolve type '{oid}': {source}")]
    ResolveType {
        oid: u32,
        #[source]
        source: TypeError,
    },
}

#[derive(Debug, Error)]
pub enum TypeError {
    #[error("get type: {0}")]
    Lookup(#[source] CatalogError),

    #[error("get variants: {0}")]
    Variants(#[source] CatalogError),

    #[error("unsupported type kind: '{0}'")]
    UnsupportedKind(char),
}

/// OID → type resolution with a per-run memo.
///
/// The memo caches the catalog-form descriptor (nullability as `pg_type`
/// declares it); the per-call override is applied to a clone after lookup,
/// so one cached fact serves call sites with different nullability.
struct TypeResolver<'a> {
    catalog: &'a dyn Catalog,
    memo: HashMap<u32, PgType>,
}

impl<'a> TypeResolver<'a> {
    fn new(catalog: &'a dyn Catalog) -> Self {
        Self {
            catalog,
            memo: HashMap::new(),
        }
    }

    async fn resolve(&mut self, oid: u32, nullable: Option<bool>) -> Result<PgType, TypeError> {
        let mut ty = match self.memo.get(&oid) {
            Some(ty) => ty.clone(),
            None => {
                let ty = self.lookup(oid).await?;
                self.memo.insert(oid, ty.clone());
                ty
            }
        };

        if let Some(nullable) = nullable {
            ty.nullable = nullable;
        }
        Ok(ty)
    }

    async fn lookup(&self, oid: u32) -> Result<PgType, TypeError> {
        let row = self
            .catalog
            .type_by_oid(oid)
            .await
            .map_err(TypeError::Lookup)?;

        match row.kind {
            b'b' => Ok(PgType::base(row.name, !row.not_null)),
            b'e' => {
                let variants = self
                    .catalog
                    .enum_variants_by_oid(oid)
                    .await
                    .map_err(TypeError::Variants)?;
                Ok(PgType::enumeration(row.name, !row.not_null, variants))
            }
            other => Err(TypeError::UnsupportedKind(other as char)),
        }
    }
}

/// Compiles a named query set against one live connection.
///
/// The connection is borrowed exclusively for the duration of
/// [`Engine::resolve_queries`]; prepares and catalog lookups are issued
/// serially so nothing interleaves on the session.
pub struct Engine {
    client: Client,
}

impl Engine {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Resolve every query in `queries` (name → SQL text) into the typed IR.
    ///
    /// The first failing query aborts the run; partial results are
    /// discarded. Dropping the returned future cancels the run at the next
    /// suspension point.
    pub async fn resolve_queries(
        &self,
        queries: &BTreeMap<String, String>,
    ) -> Result<ResolvedQueries, EngineError> {
        let catalog = PgCatalog::new(&self.client);
        let mut resolver = TypeResolver::new(&catalog);
        let mut observed: BTreeMap<String, PgType> = BTreeMap::new();
        let mut resolved = BTreeMap::new();

        for (name, sql) in queries {
            let query = self
                .resolve_query(name, sql, &catalog, &mut resolver, &mut observed)
                .await?;
            resolved.insert(name.clone(), query);
        }

        Ok(ResolvedQueries {
            types: assemble_types(observed),
            queries: resolved,
        })
    }

    async fn resolve_query(
        &self,
        name: &str,
        sql: &str,
        catalog: &dyn Catalog,
        resolver: &mut TypeResolver<'_>,
        observed: &mut BTreeMap<String, PgType>,
    ) -> Result<Query, EngineError> {
        let statement = self
            .client
            .prepare(sql)
            .await
            .map_err(|source| EngineError::Prepare {
                name: name.to_string(),
                source,
            })?;

        let plan = plan::explain_query(&self.client, sql)
            .await
            .map_err(|source| EngineError::Explain {
                name: name.to_string(),
                source,
            })?;

        // A zero row estimate on the root is how the planner reports
        // statements with no row output (INSERT without RETURNING); the
        // annotation is irrelevant then.
        let shape = if plan.plan_rows == 0 {
            QueryShape::Exec
        } else {
            parser::parse_shape(sql)
        };

        let param_names = parser::parse_param_names(sql);

        let maps = nullability::analyze(catalog, &plan)
            .await
            .map_err(|source| EngineError::Nullability {
                name: name.to_string(),
                source,
            })?;

        let mut inputs = Vec::with_capacity(statement.params().len());
        for (idx, param) in statement.params().iter().enumerate() {
            let placeholder = format!("${}", idx + 1);
            let nullable = maps.inputs.get(&placeholder).copied().unwrap_or(false);

            let oid = param.oid();
            let ty = resolver.resolve(oid, Some(nullable)).await.map_err(|source| {
                EngineError::ResolveType { oid, source }
            })?;
            observed.insert(ty.name.clone(), ty.clone());

            inputs.push(Input {
                name: param_names
                    .get(&(idx + 1).to_string())
                    .cloned()
                    .unwrap_or_default(),
                ty,
            });
        }

        let mut outputs = Vec::with_capacity(statement.columns().len());
        for (idx, column) in statement.columns().iter().enumerate() {
            let nullable = plan
                .output
                .get(idx)
                .and_then(|expr| maps.outputs.get(expr))
                .copied()
                .unwrap_or(false);

            let oid = column.type_().oid();
            let ty = resolver.resolve(oid, Some(nullable)).await.map_err(|source| {
                EngineError::ResolveType { oid, source }
            })?;
            observed.insert(ty.name.clone(), ty.clone());

            // "?column?" is the planner's no-label marker, not a name.
            let column_name = column.name();
            outputs.push(Output {
                name: if column_name == "?column?" {
                    String::new()
                } else {
                    column_name.to_string()
                },
                ty,
            });
        }

        debug!(
            "resolved query '{}': shape {}, {} inputs, {} outputs",
            name,
            shape,
            inputs.len(),
            outputs.len()
        );

        Ok(Query {
            sql: sql.trim().to_string(),
            name: name.to_string(),
            shape,
            inputs,
            outputs,
        })
    }
}

//! Catalog client
//!
//! Typed wrappers over the `pg_catalog` / `information_schema` lookups the
//! engine needs: type descriptors by OID, enum variants by OID, and column
//! nullability as declared on the base relation. Sits behind a trait so the
//! nullability analyzer and type resolver can be exercised without a server.

use async_trait::async_trait;
use thiserror::Error;
use tokio_postgres::Client;

#[derive(Debug, Error)]
#[error("catalog query: {0}")]
pub struct CatalogError(#[from] pub(crate) tokio_postgres::Error);

/// One row of `pg_type`: the type name, the `typtype` kind byte
/// (`b` base, `e` enum, others unsupported downstream), and `typnotnull`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRow {
    pub name: String,
    pub kind: u8,
    pub not_null: bool,
}

/// Read-only schema lookups against the connected database.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Look up a type descriptor in `pg_type`. Erroring on an unknown OID is
    /// the driver's no-row error; prepared statements only hand out OIDs the
    /// server knows.
    async fn type_by_oid(&self, oid: u32) -> Result<TypeRow, CatalogError>;

    /// Enum labels for the given enum type OID, in `enumsortorder`.
    async fn enum_variants_by_oid(&self, oid: u32) -> Result<Vec<String>, CatalogError>;

    /// Declared nullability of one column, `None` when `(schema, relation,
    /// column)` does not name a real column. The missing ⇒ non-null policy
    /// belongs to the caller.
    async fn column_nullability(
        &self,
        schema: &str,
        relation: &str,
        column: &str,
    ) -> Result<Option<bool>, CatalogError>;

    /// Declared nullability of every column of a relation, in ordinal
    /// position order. Empty when the relation is unknown.
    async fn relation_nullability(
        &self,
        schema: &str,
        relation: &str,
    ) -> Result<Vec<bool>, CatalogError>;
}

/// Live implementation over a tokio-postgres connection.
pub struct PgCatalog<'a> {
    client: &'a Client,
}

impl<'a> PgCatalog<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Catalog for PgCatalog<'_> {
    async fn type_by_oid(&self, oid: u32) -> Result<TypeRow, CatalogError> {
        let row = self
            .client
            .query_one(
                "select typname::text, typtype, typnotnull \
                 from pg_type where oid = $1 limit 1",
                &[&oid],
            )
            .await?;

        Ok(TypeRow {
            name: row.try_get(0)?,
            kind: row.try_get::<_, i8>(1)? as u8,
            not_null: row.try_get(2)?,
        })
    }

    async fn enum_variants_by_oid(&self, oid: u32) -> Result<Vec<String>, CatalogError> {
        let rows = self
            .client
            .query(
                "select enumlabel::text \
                 from pg_enum where enumtypid = $1 order by enumsortorder",
                &[&oid],
            )
            .await?;

        rows.iter()
            .map(|row| row.try_get(0).map_err(CatalogError))
            .collect()
    }

    async fn column_nullability(
        &self,
        schema: &str,
        relation: &str,
        column: &str,
    ) -> Result<Option<bool>, CatalogError> {
        let row = self
            .client
            .query_opt(
                "select is_nullable = 'YES' \
                 from information_schema.columns \
                 where table_schema = $1::text \
                   and table_name = $2::text \
                   and column_name = $3::text \
                 limit 1",
                &[&schema, &relation, &column],
            )
            .await?;

        row.map(|row| row.try_get(0).map_err(CatalogError))
            .transpose()
    }

    async fn relation_nullability(
        &self,
        schema: &str,
        relation: &str,
    ) -> Result<Vec<bool>, CatalogError> {
        let rows = self
            .client
            .query(
                "select is_nullable = 'YES' \
                 from information_schema.columns \
                 where table_schema = $1::text \
                   and table_name = $2::text \
                 order by ordinal_position",
                &[&schema, &relation],
            )
            .await?;

        rows.iter()
            .map(|row| row.try_get(0).map_err(CatalogError))
            .collect()
    }
}

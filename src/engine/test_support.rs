//! In-memory catalog double for engine tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::catalog::{Catalog, CatalogError, TypeRow};

/// A canned schema: tables with ordered `(column, nullable)` pairs plus a
/// `pg_type`-shaped OID table. Lookups never fail; a test asking for an OID
/// it never seeded is a test bug and panics.
pub(crate) struct FakeCatalog {
    types: HashMap<u32, TypeRow>,
    enums: HashMap<u32, Vec<String>>,
    columns: HashMap<(String, String), Vec<(String, bool)>>,
    pub(crate) type_lookups: AtomicUsize,
}

impl FakeCatalog {
    pub(crate) fn new() -> Self {
        Self {
            types: HashMap::new(),
            enums: HashMap::new(),
            columns: HashMap::new(),
            type_lookups: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_table(
        mut self,
        schema: &str,
        relation: &str,
        columns: &[(&str, bool)],
    ) -> Self {
        self.columns.insert(
            (schema.to_string(), relation.to_string()),
            columns
                .iter()
                .map(|(name, nullable)| (name.to_string(), *nullable))
                .collect(),
        );
        self
    }

    pub(crate) fn with_type(mut self, oid: u32, name: &str, kind: u8, not_null: bool) -> Self {
        self.types.insert(
            oid,
            TypeRow {
                name: name.to_string(),
                kind,
                not_null,
            },
        );
        self
    }

    pub(crate) fn with_base_type(self, oid: u32, name: &str) -> Self {
        self.with_type(oid, name, b'b', false)
    }

    pub(crate) fn with_enum_type(mut self, oid: u32, name: &str, variants: &[&str]) -> Self {
        self.enums
            .insert(oid, variants.iter().map(|v| v.to_string()).collect());
        self.with_type(oid, name, b'e', false)
    }
}

#[async_trait]
impl Catalog for FakeCatalog {
    async fn type_by_oid(&self, oid: u32) -> Result<TypeRow, CatalogError> {
        self.type_lookups.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .types
            .get(&oid)
            .cloned()
            .unwrap_or_else(|| panic!("FakeCatalog: no type seeded for oid {oid}")))
    }

    async fn enum_variants_by_oid(&self, oid: u32) -> Result<Vec<String>, CatalogError> {
        Ok(self.enums.get(&oid).cloned().unwrap_or_default())
    }

    async fn column_nullability(
        &self,
        schema: &str,
        relation: &str,
        column: &str,
    ) -> Result<Option<bool>, CatalogError> {
        let columns = self
            .columns
            .get(&(schema.to_string(), relation.to_string()));

        Ok(columns.and_then(|columns| {
            columns
                .iter()
                .find(|(name, _)| name == column)
                .map(|(_, nullable)| *nullable)
        }))
    }

    async fn relation_nullability(
        &self,
        schema: &str,
        relation: &str,
    ) -> Result<Vec<bool>, CatalogError> {
        Ok(self
            .columns
            .get(&(schema.to_string(), relation.to_string()))
            .map(|columns| columns.iter().map(|(_, nullable)| *nullable).collect())
            .unwrap_or_default())
    }
}

//! Resolved-query intermediate representation
//!
//! The IR layer decouples the engine from the printer. It carries exactly
//! what code generation needs: per-query input/output types with their
//! per-use nullability, and the deduplicated catalog of types seen across
//! all queries.

use std::collections::BTreeMap;

use strum_macros::{Display, EnumString};

/// Whether a resolved type is a scalar base type or a server-defined enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeKind {
    Base,
    Enum,
}

/// A resolved Postgres type.
///
/// `name` is the server-reported `pg_type.typname` (e.g. `int4`, `text`,
/// or an enum's name); identifier casing is the printer's concern.
/// `variants` is non-empty exactly when `kind` is [`TypeKind::Enum`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgType {
    pub kind: TypeKind,
    pub name: String,
    pub nullable: bool,
    pub variants: Vec<String>,
}

impl PgType {
    pub fn base(name: impl Into<String>, nullable: bool) -> Self {
        Self {
            kind: TypeKind::Base,
            name: name.into(),
            nullable,
            variants: Vec::new(),
        }
    }

    pub fn enumeration(name: impl Into<String>, nullable: bool, variants: Vec<String>) -> Self {
        Self {
            kind: TypeKind::Enum,
            name: name.into(),
            nullable,
            variants,
        }
    }
}

/// The execution shape of a generated call: discard rows, expect exactly
/// one, or collect all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum QueryShape {
    Exec,
    One,
    Many,
}

/// A positional query parameter. `name` is empty when the query carries no
/// `-- $N: name` directive for this position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    pub name: String,
    pub ty: PgType,
}

/// A result column. `name` is the server-assigned column name, with
/// Postgres's `?column?` no-label sentinel normalized to the empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub name: String,
    pub ty: PgType,
}

/// One fully resolved query: trimmed SQL, execution shape, and typed
/// inputs/outputs in placeholder/field order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub sql: String,
    pub name: String,
    pub shape: QueryShape,
    pub inputs: Vec<Input>,
    pub outputs: Vec<Output>,
}

/// The result of resolving a whole query set.
///
/// `types` holds every type observed across all queries, deduplicated by
/// name, in catalog form (`nullable = false`), sorted by `(kind, name)`.
/// Per-use nullability lives on [`Input::ty`] / [`Output::ty`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedQueries {
    pub types: Vec<PgType>,
    pub queries: BTreeMap<String, Query>,
}

/// Collapse the observed-type map into the canonical `types` list:
/// strip per-use nullability, then stable-sort by `(kind, name)`.
pub(crate) fn assemble_types(observed: BTreeMap<String, PgType>) -> Vec<PgType> {
    let mut types: Vec<PgType> = observed
        .into_values()
        .map(|mut ty| {
            ty.nullable = false;
            ty
        })
        .collect();

    types.sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| a.name.cmp(&b.name)));
    types
}

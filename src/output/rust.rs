//! Rust code printer
//!
//! Emits a tokio-postgres data-access layer: a `Store` wrapper
//! (`database.rs`), enum models (`models.rs`), and one async method per
//! query (`queries.rs`). Nullable columns and parameters become `Option`;
//! enums derive `postgres_types::ToSql`/`FromSql` with the server-side
//! names attached verbatim, so the generated crate needs `postgres-types`
//! with its `derive` feature alongside `tokio-postgres`.

use std::collections::BTreeMap;

use crate::engine::ir::{PgType, Query, QueryShape, ResolvedQueries, TypeKind};
use crate::output::{PrintError, Printer, Rendered, casing};

const HEADER: &str = "// Code generated by pg-typegen. Do not edit.\n";

const DATABASE_SRC: &str = "\
// Code generated by pg-typegen. Do not edit.

pub struct Store {
    client: tokio_postgres::Client,
}

impl Store {
    pub fn new(client: tokio_postgres::Client) -> Self {
        Self { client }
    }
}
";

/// Built-in `typname` → Rust type spellings. Anything not listed here must
/// come in through `[overrides]`.
fn base_type(name: &str) -> Option<&'static str> {
    match name {
        "int2" => Some("i16"),
        "int4" => Some("i32"),
        "int8" => Some("i64"),
        "float4" => Some("f32"),
        "float8" => Some("f64"),
        "text" | "varchar" | "bpchar" | "name" => Some("String"),
        "bool" => Some("bool"),
        "bytea" => Some("Vec<u8>"),
        "oid" => Some("u32"),
        "char" => Some("i8"),
        _ => None,
    }
}

pub struct RustPrinter {
    overrides: BTreeMap<String, String>,
}

impl RustPrinter {
    /// `overrides` maps a Postgres `typname` to a fully qualified Rust type
    /// path, taking precedence over the built-in table and over enum model
    /// generation.
    pub fn new(overrides: BTreeMap<String, String>) -> Self {
        Self { overrides }
    }

    fn scalar_type(&self, ty: &PgType) -> Result<String, PrintError> {
        if let Some(path) = self.overrides.get(&ty.name) {
            return Ok(path.clone());
        }

        match ty.kind {
            TypeKind::Enum => Ok(format!("super::models::{}", casing::pascal(&ty.name))),
            TypeKind::Base => base_type(&ty.name)
                .map(str::to_string)
                .ok_or_else(|| PrintError::UnmappedType(ty.name.clone())),
        }
    }

    /// Type of a row-struct field or scalar return value.
    fn field_type(&self, ty: &PgType) -> Result<String, PrintError> {
        let inner = self.scalar_type(ty)?;
        Ok(if ty.nullable {
            format!("Option<{inner}>")
        } else {
            inner
        })
    }

    /// Type of a method parameter: owned strings are taken as `&str`.
    fn param_type(&self, ty: &PgType) -> Result<String, PrintError> {
        let mut inner = self.scalar_type(ty)?;
        if inner == "String" {
            inner = "&str".to_string();
        }
        Ok(if ty.nullable {
            format!("Option<{inner}>")
        } else {
            inner
        })
    }

    fn print_models(&self, resolved: &ResolvedQueries) -> String {
        let mut out = String::from(HEADER);

        for ty in &resolved.types {
            if ty.kind != TypeKind::Enum || self.overrides.contains_key(&ty.name) {
                continue;
            }

            out.push('\n');
            out.push_str(&format!("/// Postgres enum `{}`.\n", ty.name));
            out.push_str(
                "#[derive(Debug, Clone, Copy, PartialEq, Eq, postgres_types::ToSql, postgres_types::FromSql)]\n",
            );
            out.push_str(&format!("#[postgres(name = \"{}\")]\n", ty.name));
            out.push_str(&format!("pub enum {} {{\n", casing::pascal(&ty.name)));
            for variant in &ty.variants {
                out.push_str(&format!("    #[postgres(name = \"{variant}\")]\n"));
                out.push_str(&format!("    {},\n", casing::pascal(variant)));
            }
            out.push_str("}\n");
        }

        out
    }

    fn print_queries(&self, resolved: &ResolvedQueries) -> Result<String, PrintError> {
        let mut out = String::from(HEADER);
        out.push_str("\nuse super::database::Store;\n");

        for query in resolved.queries.values() {
            out.push('\n');
            self.print_query(&mut out, query)?;
        }

        Ok(out)
    }

    fn print_query(&self, out: &mut String, query: &Query) -> Result<(), PrintError> {
        let method = casing::snake(&query.name);
        let sql = format!("{:?}", query.sql);

        let mut params = String::new();
        let mut args = String::new();
        for (idx, input) in query.inputs.iter().enumerate() {
            let name = if input.name.is_empty() {
                format!("arg{idx}")
            } else {
                casing::snake(&input.name)
            };

            params.push_str(&format!(", {}: {}", name, self.param_type(&input.ty)?));
            if idx > 0 {
                args.push_str(", ");
            }
            args.push_str(&format!("&{name}"));
        }

        match query.shape {
            QueryShape::Exec => {
                out.push_str(&format!(
                    "impl Store {{\n    \
                         pub async fn {method}(&self{params}) -> Result<(), tokio_postgres::Error> {{\n        \
                             self.client.execute({sql}, &[{args}]).await?;\n        \
                             Ok(())\n    \
                         }}\n\
                     }}\n"
                ));
            }

            QueryShape::One if query.outputs.len() == 1 => {
                let ret = self.field_type(&query.outputs[0].ty)?;
                out.push_str(&format!(
                    "impl Store {{\n    \
                         pub async fn {method}(&self{params}) -> Result<{ret}, tokio_postgres::Error> {{\n        \
                             let row = self.client.query_one({sql}, &[{args}]).await?;\n        \
                             row.try_get(0)\n    \
                         }}\n\
                     }}\n"
                ));
            }

            QueryShape::One => {
                let row_struct = format!("{}Row", casing::pascal(&query.name));
                self.print_row_struct(out, &row_struct, query)?;
                out.push_str(&format!(
                    "\nimpl Store {{\n    \
                         pub async fn {method}(&self{params}) -> Result<{row_struct}, tokio_postgres::Error> {{\n        \
                             let row = self.client.query_one({sql}, &[{args}]).await?;\n        \
                             Ok({row_struct} {{\n{fields}        }})\n    \
                         }}\n\
                     }}\n",
                    fields = row_literal_fields(query, 12),
                ));
            }

            QueryShape::Many if query.outputs.len() == 1 => {
                let item = self.field_type(&query.outputs[0].ty)?;
                out.push_str(&format!(
                    "impl Store {{\n    \
                         pub async fn {method}(&self{params}) -> Result<Vec<{item}>, tokio_postgres::Error> {{\n        \
                             let rows = self.client.query({sql}, &[{args}]).await?;\n        \
                             rows.into_iter().map(|row| row.try_get(0)).collect()\n    \
                         }}\n\
                     }}\n"
                ));
            }

            QueryShape::Many => {
                let row_struct = format!("{}Row", casing::pascal(&query.name));
                self.print_row_struct(out, &row_struct, query)?;
                out.push_str(&format!(
                    "\nimpl Store {{\n    \
                         pub async fn {method}(&self{params}) -> Result<Vec<{row_struct}>, tokio_postgres::Error> {{\n        \
                             let rows = self.client.query({sql}, &[{args}]).await?;\n        \
                             rows.into_iter()\n            \
                                 .map(|row| {{\n                \
                                     Ok({row_struct} {{\n{fields}                }})\n            \
                                 }})\n            \
                                 .collect()\n    \
                         }}\n\
                     }}\n",
                    fields = row_literal_fields(query, 20),
                ));
            }
        }

        Ok(())
    }

    fn print_row_struct(
        &self,
        out: &mut String,
        name: &str,
        query: &Query,
    ) -> Result<(), PrintError> {
        out.push_str("#[derive(Debug)]\n");
        out.push_str(&format!("pub struct {name} {{\n"));
        for (idx, output) in query.outputs.iter().enumerate() {
            out.push_str(&format!(
                "    pub {}: {},\n",
                field_name(&output.name, idx),
                self.field_type(&output.ty)?
            ));
        }
        out.push_str("}\n");
        Ok(())
    }
}

impl Printer for RustPrinter {
    fn print(&self, resolved: &ResolvedQueries) -> Result<Rendered, PrintError> {
        Ok(Rendered {
            database: DATABASE_SRC.to_string(),
            models: self.print_models(resolved),
            queries: self.print_queries(resolved)?,
        })
    }
}

fn field_name(name: &str, idx: usize) -> String {
    if name.is_empty() {
        format!("field{idx}")
    } else {
        casing::snake(name)
    }
}

/// `name: row.try_get(N)?,` lines for a row-struct literal, at the given
/// indent depth.
fn row_literal_fields(query: &Query, indent: usize) -> String {
    let mut fields = String::new();
    for (idx, output) in query.outputs.iter().enumerate() {
        fields.push_str(&format!(
            "{:indent$}{}: row.try_get({idx})?,\n",
            "",
            field_name(&output.name, idx),
        ));
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ir::{Input, Output};
    use std::collections::BTreeMap as Map;

    fn printer() -> RustPrinter {
        RustPrinter::new(Map::new())
    }

    fn resolved_with_query(query: Query) -> ResolvedQueries {
        let mut queries = Map::new();
        queries.insert(query.name.clone(), query);
        ResolvedQueries {
            types: Vec::new(),
            queries,
        }
    }

    #[test]
    fn test_database_store_wrapper() {
        let rendered = printer().print(&ResolvedQueries::default()).unwrap();
        assert!(rendered.database.contains("pub struct Store"));
        assert!(
            rendered
                .database
                .contains("pub fn new(client: tokio_postgres::Client) -> Self")
        );
    }

    #[test]
    fn test_exec_query_emission() {
        let query = Query {
            sql: "delete from users where id = $1".to_string(),
            name: "delete_user".to_string(),
            shape: QueryShape::Exec,
            inputs: vec![Input {
                name: "id".to_string(),
                ty: PgType::base("int4", false),
            }],
            outputs: vec![],
        };

        let rendered = printer().print(&resolved_with_query(query)).unwrap();
        let expected = "\
// Code generated by pg-typegen. Do not edit.

use super::database::Store;

impl Store {
    pub async fn delete_user(&self, id: i32) -> Result<(), tokio_postgres::Error> {
        self.client.execute(\"delete from users where id = $1\", &[&id]).await?;
        Ok(())
    }
}
";
        assert_eq!(rendered.queries, expected);
    }

    #[test]
    fn test_one_query_with_single_output_returns_scalar() {
        let query = Query {
            sql: "select username from users where id = $1 limit 1".to_string(),
            name: "get_username".to_string(),
            shape: QueryShape::One,
            inputs: vec![Input {
                name: "id".to_string(),
                ty: PgType::base("int4", false),
            }],
            outputs: vec![Output {
                name: "username".to_string(),
                ty: PgType::base("text", true),
            }],
        };

        let rendered = printer().print(&resolved_with_query(query)).unwrap();
        assert!(rendered.queries.contains(
            "pub async fn get_username(&self, id: i32) -> Result<Option<String>, tokio_postgres::Error>"
        ));
        assert!(rendered.queries.contains("query_one"));
        assert!(rendered.queries.contains("row.try_get(0)"));
        assert!(!rendered.queries.contains("pub struct"));
    }

    #[test]
    fn test_many_query_emits_row_struct() {
        let query = Query {
            sql: "select * from users".to_string(),
            name: "get_users".to_string(),
            shape: QueryShape::Many,
            inputs: vec![],
            outputs: vec![
                Output {
                    name: "id".to_string(),
                    ty: PgType::base("int4", false),
                },
                Output {
                    name: "username".to_string(),
                    ty: PgType::base("text", true),
                },
            ],
        };

        let rendered = printer().print(&resolved_with_query(query)).unwrap();
        assert!(rendered.queries.contains("pub struct GetUsersRow {"));
        assert!(rendered.queries.contains("    pub id: i32,"));
        assert!(rendered.queries.contains("    pub username: Option<String>,"));
        assert!(rendered.queries.contains(
            "pub async fn get_users(&self) -> Result<Vec<GetUsersRow>, tokio_postgres::Error>"
        ));
        assert!(rendered.queries.contains("id: row.try_get(0)?,"));
        assert!(rendered.queries.contains("username: row.try_get(1)?,"));
    }

    #[test]
    fn test_unnamed_input_and_output_get_positional_names() {
        let query = Query {
            sql: "select 1 where $1".to_string(),
            name: "probe".to_string(),
            shape: QueryShape::One,
            inputs: vec![Input {
                name: String::new(),
                ty: PgType::base("bool", false),
            }],
            outputs: vec![Output {
                name: String::new(),
                ty: PgType::base("int4", false),
            }],
        };

        let rendered = printer().print(&resolved_with_query(query)).unwrap();
        assert!(rendered.queries.contains("arg0: bool"));
        assert!(rendered.queries.contains("&[&arg0]"));
    }

    #[test]
    fn test_enum_model_emission() {
        let resolved = ResolvedQueries {
            types: vec![PgType::enumeration(
                "status",
                false,
                vec!["open".to_string(), "on_hold".to_string()],
            )],
            queries: Map::new(),
        };

        let models = printer().print(&resolved).unwrap().models;
        assert!(models.contains("#[postgres(name = \"status\")]"));
        assert!(models.contains("pub enum Status {"));
        assert!(models.contains("    #[postgres(name = \"on_hold\")]\n    OnHold,"));
    }

    #[test]
    fn test_enum_typed_column_references_models_module() {
        let query = Query {
            sql: "select status from tickets".to_string(),
            name: "get_statuses".to_string(),
            shape: QueryShape::Many,
            inputs: vec![],
            outputs: vec![Output {
                name: "status".to_string(),
                ty: PgType::enumeration("status", false, vec!["open".to_string()]),
            }],
        };

        let rendered = printer().print(&resolved_with_query(query)).unwrap();
        assert!(
            rendered
                .queries
                .contains("Result<Vec<super::models::Status>, tokio_postgres::Error>")
        );
    }

    #[test]
    fn test_override_replaces_builtin_and_enum_mapping() {
        let mut overrides = Map::new();
        overrides.insert("uuid".to_string(), "uuid::Uuid".to_string());
        let printer = RustPrinter::new(overrides);

        let query = Query {
            sql: "select id from sessions".to_string(),
            name: "get_session_ids".to_string(),
            shape: QueryShape::Many,
            inputs: vec![],
            outputs: vec![Output {
                name: "id".to_string(),
                ty: PgType::base("uuid", false),
            }],
        };

        let rendered = printer.print(&resolved_with_query(query)).unwrap();
        assert!(
            rendered
                .queries
                .contains("Result<Vec<uuid::Uuid>, tokio_postgres::Error>")
        );
    }

    #[test]
    fn test_overridden_enum_is_not_emitted_as_model() {
        let mut overrides = Map::new();
        overrides.insert("status".to_string(), "crate::Status".to_string());
        let printer = RustPrinter::new(overrides);

        let resolved = ResolvedQueries {
            types: vec![PgType::enumeration(
                "status",
                false,
                vec!["open".to_string()],
            )],
            queries: Map::new(),
        };

        let models = printer.print(&resolved).unwrap().models;
        assert!(!models.contains("pub enum Status"));
    }

    #[test]
    fn test_unmapped_base_type_is_an_error() {
        let query = Query {
            sql: "select created_at from users".to_string(),
            name: "get_created".to_string(),
            shape: QueryShape::Many,
            inputs: vec![],
            outputs: vec![Output {
                name: "created_at".to_string(),
                ty: PgType::base("timestamptz", false),
            }],
        };

        let err = printer()
            .print(&resolved_with_query(query))
            .unwrap_err();
        assert!(matches!(err, PrintError::UnmappedType(ref name) if name == "timestamptz"));
    }

    #[test]
    fn test_nullable_text_param_borrows_as_option_str() {
        let query = Query {
            sql: "insert into users(username) values ($1)".to_string(),
            name: "add_user".to_string(),
            shape: QueryShape::Exec,
            inputs: vec![Input {
                name: "username".to_string(),
                ty: PgType::base("text", true),
            }],
            outputs: vec![],
        };

        let rendered = printer().print(&resolved_with_query(query)).unwrap();
        assert!(rendered.queries.contains("username: Option<&str>"));
    }
}

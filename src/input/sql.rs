//! SQL file loading
//!
//! Reads `.sql` query files from a directory and returns them keyed by file
//! stem, ready for the engine to compile. The stem becomes the query name,
//! so `get_user_by_id.sql` resolves as `get_user_by_id`.

use std::collections::BTreeMap;
use std::path::Path;

use crate::input::LoadError;

/// Loader for directories of plain SQL query files.
///
/// Only regular `*.sql` entries at the top level are collected;
/// subdirectories and other extensions are skipped. The returned map is
/// ordered by name, so enumeration is deterministic across runs.
pub struct SqlLoader;

impl SqlLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load every query file in `dir`. File contents are trimmed of
    /// surrounding whitespace; the annotation lines stay part of the query
    /// text (the engine's parser reads them, and the server ignores them).
    pub fn load(&self, dir: &Path) -> Result<BTreeMap<String, String>, LoadError> {
        let entries = std::fs::read_dir(dir).map_err(|source| LoadError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut queries = BTreeMap::new();
        for entry in entries {
            let entry = entry.map_err(|source| LoadError::Io {
                path: dir.to_path_buf(),
                source,
            })?;

            let path = entry.path();
            if !path.is_file() || path.extension().is_none_or(|ext| ext != "sql") {
                continue;
            }

            let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };

            let sql = std::fs::read_to_string(&path).map_err(|source| LoadError::Io {
                path: path.clone(),
                source,
            })?;

            queries.insert(name.to_string(), sql.trim().to_string());
        }

        Ok(queries)
    }
}

impl Default for SqlLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_collects_sql_files_by_stem() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("get_users.sql"), "-- :many\nselect 1\n").unwrap();
        std::fs::write(dir.path().join("delete_user.sql"), "  -- :exec\ndelete\n  ").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a query").unwrap();
        std::fs::create_dir(dir.path().join("archive")).unwrap();

        let queries = SqlLoader::new().load(dir.path()).unwrap();

        assert_eq!(queries.len(), 2);
        assert_eq!(queries["get_users"], "-- :many\nselect 1");
        assert_eq!(queries["delete_user"], "-- :exec\ndelete");
    }

    #[test]
    fn test_load_is_sorted_by_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("zeta.sql"), "select 1").unwrap();
        std::fs::write(dir.path().join("alpha.sql"), "select 2").unwrap();

        let queries = SqlLoader::new().load(dir.path()).unwrap();
        let names: Vec<&String> = queries.keys().collect();
        assert_eq!(names, ["alpha", "zeta"]);
    }

    #[test]
    fn test_load_missing_directory_reports_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("no-such-dir");

        let err = SqlLoader::new().load(&missing).unwrap_err();
        let LoadError::Io { path, .. } = err;
        assert_eq!(path, missing);
    }
}

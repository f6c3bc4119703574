use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{LoadError, RegistryError, Result};

/// The statements of one resource file, keyed by query name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryFile {
    queries: HashMap<String, String>,
}

impl QueryFile {
    /// Parses a TOML document into a flat name -> SQL mapping.
    ///
    /// Nested tables are flattened into dotted names, so `[user] find = ".."`
    /// registers `user.find`.
    pub fn parse(source: &str) -> std::result::Result<Self, LoadError> {
        let table: toml::Table = source.parse()?;
        let mut queries = HashMap::new();
        flatten_into(&mut queries, None, table)?;
        Ok(Self { queries })
    }

    /// Returns the SQL text registered under `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.queries.get(name).map(String::as_str)
    }

    /// Iterates query names in unspecified order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.queries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}

fn flatten_into(
    out: &mut HashMap<String, String>,
    prefix: Option<&str>,
    table: toml::Table,
) -> std::result::Result<(), LoadError> {
    for (key, value) in table {
        let key = match prefix {
            Some(prefix) => format!("{prefix}.{key}"),
            None => key,
        };
        match value {
            toml::Value::String(sql) => {
                out.insert(key, sql);
            }
            toml::Value::Table(nested) => flatten_into(out, Some(&key), nested)?,
            _ => return Err(LoadError::NotAString { key }),
        }
    }
    Ok(())
}

/// Process-wide lookup of SQL text by `(file, name)`.
///
/// Construct it once with [`QueryRegistry::load`] and share it read-only.
/// There is no mutation API: a registry that exists is fully initialized.
#[derive(Debug, Clone, Default)]
pub struct QueryRegistry {
    files: HashMap<String, QueryFile>,
}

impl QueryRegistry {
    /// Loads every `*.{extension}` file directly under `root`.
    ///
    /// Each file is registered under its base name with the extension
    /// stripped. Any unreadable or malformed file aborts the whole load.
    #[tracing::instrument(skip_all, fields(root = %root.as_ref().display(), extension = %extension))]
    pub fn load(root: impl AsRef<Path>, extension: &str) -> Result<Self> {
        let root = root.as_ref();
        let entries = fs::read_dir(root).map_err(|e| init_failed(root, e.into()))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| init_failed(root, e.into()))?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == extension) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut files = HashMap::with_capacity(paths.len());
        for path in paths {
            let key = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| init_failed(&path, LoadError::InvalidFileName))?;
            let source = fs::read_to_string(&path).map_err(|e| init_failed(&path, e.into()))?;
            let file = QueryFile::parse(&source).map_err(|e| init_failed(&path, e))?;
            tracing::info!(file = key, queries = file.len(), "loaded named queries");
            files.insert(key.to_string(), file);
        }

        tracing::info!(files = files.len(), "named query registry ready");
        Ok(Self { files })
    }

    /// Builds a registry from in-memory `(file key, TOML source)` pairs.
    pub fn from_sources<'a, I>(sources: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut files = HashMap::new();
        for (key, source) in sources {
            let file = QueryFile::parse(source).map_err(|e| init_failed(Path::new(key), e))?;
            files.insert(key.to_string(), file);
        }
        Ok(Self { files })
    }

    /// Resolves the SQL text for `name` inside `file`.
    pub fn get(&self, file: &str, name: &str) -> Result<&str> {
        if let Some(sql) = self.files.get(file).and_then(|f| f.get(name)) {
            return Ok(sql);
        }
        metrics::counter!("named_query_lookup_misses_total").increment(1);
        tracing::error!(file, name, "could not find sql query");
        Err(RegistryError::StatementNotFound {
            file: file.to_string(),
            name: name.to_string(),
        })
    }

    /// Returns the statements of one file.
    pub fn file(&self, file: &str) -> Option<&QueryFile> {
        self.files.get(file)
    }

    /// Iterates registered file keys in unspecified order.
    pub fn file_keys(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Total number of statements across all files.
    pub fn query_count(&self) -> usize {
        self.files.values().map(QueryFile::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn init_failed(path: &Path, source: LoadError) -> RegistryError {
    RegistryError::InitializationFailed {
        path: PathBuf::from(path),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER_QUERIES: &str = r#"
find_by_id = "select id, name from users where id = :id"
find_all = """
select id, name
from users
"""

[admin]
list = "select id from users where admin"
"#;

    fn registry() -> QueryRegistry {
        QueryRegistry::from_sources([("user", USER_QUERIES), ("empty", "")]).unwrap()
    }

    #[test]
    fn get_returns_registered_text() {
        let registry = registry();
        assert_eq!(
            registry.get("user", "find_by_id").unwrap(),
            "select id, name from users where id = :id"
        );
        assert_eq!(
            registry.get("user", "find_all").unwrap(),
            "select id, name\nfrom users\n"
        );
    }

    #[test]
    fn nested_tables_flatten_to_dotted_names() {
        let registry = registry();
        assert_eq!(
            registry.get("user", "admin.list").unwrap(),
            "select id from users where admin"
        );
    }

    #[test]
    fn missing_name_is_statement_not_found() {
        let err = registry().get("user", "delete").unwrap_err();
        match err {
            RegistryError::StatementNotFound { file, name } => {
                assert_eq!(file, "user");
                assert_eq!(name, "delete");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_file_is_statement_not_found() {
        let err = registry().get("order", "find_by_id").unwrap_err();
        assert!(matches!(err, RegistryError::StatementNotFound { .. }));
        assert_eq!(err.to_string(), "Could not find sql query: order - find_by_id");
    }

    #[test]
    fn non_string_value_fails_to_parse() {
        let err = QueryFile::parse("limit = 10").unwrap_err();
        assert!(matches!(err, LoadError::NotAString { ref key } if key == "limit"));
    }

    #[test]
    fn malformed_source_is_initialization_failure() {
        let err = QueryRegistry::from_sources([("broken", "find = ")]).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::InitializationFailed {
                source: LoadError::Parse(_),
                ..
            }
        ));
    }

    #[test]
    fn counts_files_and_queries() {
        let registry = registry();
        assert_eq!(registry.query_count(), 3);
        assert!(registry.file("empty").unwrap().is_empty());
        let mut keys: Vec<_> = registry.file_keys().collect();
        keys.sort();
        assert_eq!(keys, vec!["empty", "user"]);
    }
}

//! Purpose: Owned execution context mapping database names to loaded databases.
//! Exports: `Registry`.
//! Role: Resolves names inside one database directory; loads databases lazily.
//! Invariants: At most one loaded `Database` per name; the registry owns it.
//! Invariants: Name resolution follows `db_paths` rules shared with the CLI.
#![allow(clippy::result_large_err)]

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::database::Database;
use crate::core::error::{Error, ErrorKind};
use crate::db_paths::{DbNameResolveError, default_db_dir, resolve_named_db_path};

pub type ApiResult<T> = Result<T, Error>;

#[derive(Debug)]
pub struct Registry {
    db_dir: PathBuf,
    databases: HashMap<String, Database>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            db_dir: default_db_dir(),
            databases: HashMap::new(),
        }
    }

    pub fn with_db_dir(mut self, db_dir: impl Into<PathBuf>) -> Self {
        self.db_dir = db_dir.into();
        self
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.databases.contains_key(name)
    }

    /// Creates a new empty database file and registers it, replacing any stale entry.
    pub fn create_database(&mut self, name: &str) -> ApiResult<&mut Database> {
        let path = resolve_name(name, &self.db_dir)?;
        let database = Database::create(&path)?;
        debug!(db = name, path = %path.display(), "created database");
        Ok(self
            .databases
            .entry(name.to_string())
            .insert_entry(database)
            .into_mut())
    }

    /// Returns the registered database, loading it from disk on first use.
    pub fn database(&mut self, name: &str) -> ApiResult<&mut Database> {
        match self.databases.entry(name.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let path = resolve_name(name, &self.db_dir)?;
                let database = Database::open(&path).map_err(|err| {
                    if err.kind() == ErrorKind::NotFound {
                        Error::new(ErrorKind::NotFound)
                            .with_message(format!("couldn't open database {name}"))
                            .with_path(&path)
                            .with_hint("Create it first with CREATE_DATABASE.")
                    } else {
                        err
                    }
                })?;
                debug!(db = name, "loaded database");
                Ok(entry.insert(database))
            }
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

fn resolve_name(name: &str, db_dir: &Path) -> ApiResult<PathBuf> {
    resolve_named_db_path(name, db_dir).map_err(|err| map_db_name_resolve_error(err, name))
}

fn map_db_name_resolve_error(err: DbNameResolveError, name: &str) -> Error {
    let message = match err {
        DbNameResolveError::Empty => "database name must not be empty".to_string(),
        DbNameResolveError::ContainsPathSeparator => {
            format!("database name {name} must not contain path separators")
        }
        DbNameResolveError::Reserved => format!("database name {name} is reserved"),
    };
    Error::new(ErrorKind::Usage).with_message(message)
}

#[cfg(test)]
mod tests {
    use super::Registry;
    use crate::core::error::ErrorKind;

    #[test]
    fn create_registers_and_rejects_duplicates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut registry = Registry::new().with_db_dir(dir.path());
        registry.create_database("db1").expect("create");
        assert!(registry.is_loaded("db1"));
        assert!(dir.path().join("db1").is_file());

        let err = registry.create_database("db1").expect_err("dup");
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    }

    #[test]
    fn existing_file_is_loaded_lazily() {
        let dir = tempfile::tempdir().expect("tempdir");
        {
            let mut registry = Registry::new().with_db_dir(dir.path());
            let db = registry.create_database("db1").expect("create");
            db.create_table_if_not_exists("t").expect("table");
            db.write("t", "k", "v").expect("write");
        }

        let mut registry = Registry::new().with_db_dir(dir.path());
        assert!(!registry.is_loaded("db1"));
        let db = registry.database("db1").expect("load");
        assert_eq!(db.read("t", "k").expect("read").as_deref(), Some("v"));
        assert!(registry.is_loaded("db1"));
    }

    #[test]
    fn missing_database_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut registry = Registry::new().with_db_dir(dir.path());
        let err = registry.database("nope").expect_err("missing");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.message().unwrap_or_default().contains("nope"));
        assert!(!registry.is_loaded("nope"));
    }

    #[test]
    fn path_like_names_are_usage_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut registry = Registry::new().with_db_dir(dir.path());
        let err = registry.create_database("../escape").expect_err("usage");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }
}

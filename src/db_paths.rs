//! Purpose: Database-directory and database-name path resolution helpers.
//! Exports: `default_db_dir` and `resolve_named_db_path`.
//! Role: Keep CLI and registry path semantics aligned from one source.
//! Invariants: Default directory is `$TABLEKV_DIR`, else the current directory.
//! Invariants: Database names are bare file names; no path separators.

use std::path::{Path, PathBuf};

pub const DB_DIR_ENV: &str = "TABLEKV_DIR";

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DbNameResolveError {
    Empty,
    ContainsPathSeparator,
    Reserved,
}

pub fn default_db_dir() -> PathBuf {
    std::env::var_os(DB_DIR_ENV)
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn resolve_named_db_path(name: &str, db_dir: &Path) -> Result<PathBuf, DbNameResolveError> {
    if name.is_empty() {
        return Err(DbNameResolveError::Empty);
    }
    if name.contains('/') || (cfg!(windows) && name.contains('\\')) {
        return Err(DbNameResolveError::ContainsPathSeparator);
    }
    if name == "." || name == ".." {
        return Err(DbNameResolveError::Reserved);
    }
    Ok(db_dir.join(name))
}

//! Purpose: Table-aware reads and writes over one backing store.
//! Exports: `Database`.
//! Role: Owns a `BackingStore` and the `TableIndex` describing it.
//! Invariants: Every operation holds the store's exclusive lock from read to rewrite.
//! Invariants: The index always describes the store at `line_count` lines.
//! Invariants: Writes to an unknown table leave the file untouched.

use std::path::Path;

use tracing::{debug, warn};

use crate::core::error::{Error, ErrorKind};
use crate::core::format::{
    entry_line, entry_value, marker_block, matches_key, validate_key, validate_table_name,
    validate_value,
};
use crate::core::index::{TableBounds, TableIndex, build_index};
use crate::core::store::BackingStore;

#[derive(Debug)]
pub struct Database {
    name: String,
    store: BackingStore,
    index: TableIndex,
    line_count: usize,
}

impl Database {
    /// Creates a new empty backing store at `path` and opens it.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        BackingStore::create(path).map_err(|err| {
            if err.kind() == ErrorKind::AlreadyExists {
                err.with_message(format!("database {} already exists", display_name(path)))
            } else {
                err
            }
        })?;
        Self::open(path)
    }

    /// Opens an existing backing store and indexes it with a full scan.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let store = BackingStore::open(path.as_ref())?;
        let lines = store.lock()?.read_lines()?;
        let index = build_index(&lines).map_err(|err| err.with_path(store.path()))?;
        let name = display_name(store.path());
        debug!(db = %name, tables = index.len(), lines = lines.len(), "indexed database");
        Ok(Self {
            name,
            store,
            index,
            line_count: lines.len(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        self.store.path()
    }

    pub fn has_table(&self, table: &str) -> bool {
        self.index.contains(table)
    }

    pub fn table_bounds(&self, table: &str) -> Option<TableBounds> {
        self.index.get(table)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.index.names()
    }

    pub fn create_table_if_not_exists(&mut self, table: &str) -> Result<(), Error> {
        validate_table_name(table)?;
        let mut lock = self.store.lock()?;
        let lines = lock.read_lines()?;
        refresh_index(&mut self.index, &mut self.line_count, &lines, self.store.path())?;

        if self.index.contains(table) {
            return Err(Error::new(ErrorKind::AlreadyExists)
                .with_message(format!("table {table} already exists"))
                .with_table(table)
                .with_path(self.store.path()));
        }

        lock.append(&marker_block(table))?;
        let count = lock.read_lines()?.len();
        self.index.insert(table, TableBounds::empty(count));
        self.line_count = count;
        debug!(db = %self.name, table, start = count, "created table");
        Ok(())
    }

    pub fn create_table_with_segment_size(
        &mut self,
        table: &str,
        segment_size_bytes: u64,
    ) -> Result<(), Error> {
        Err(Error::new(ErrorKind::Unsupported)
            .with_message(format!(
                "segment-sized tables are not supported (requested {segment_size_bytes} bytes)"
            ))
            .with_table(table)
            .with_hint("Create the table without a segment size."))
    }

    /// Looks up `key` in `table`. Unknown tables and missing keys both yield `None`.
    pub fn read(&mut self, table: &str, key: &str) -> Result<Option<String>, Error> {
        validate_table_name(table)?;
        validate_key(key)?;
        let lines = self.store.lock()?.read_lines()?;
        refresh_index(&mut self.index, &mut self.line_count, &lines, self.store.path())?;

        let Some(bounds) = self.index.get(table) else {
            return Ok(None);
        };
        let value = scan_range(&lines, bounds, key).map(|at| entry_value(key, &lines[at]).to_owned());
        Ok(value)
    }

    /// Inserts `key` into `table` or overwrites its current value.
    ///
    /// A write to an unknown table is ignored before the key or value is checked.
    pub fn write(&mut self, table: &str, key: &str, value: &str) -> Result<(), Error> {
        let mut lock = self.store.lock()?;
        let mut lines = lock.read_lines()?;
        refresh_index(&mut self.index, &mut self.line_count, &lines, self.store.path())?;

        let Some(bounds) = self.index.get(table) else {
            debug!(db = %self.name, table, "write to unknown table ignored");
            return Ok(());
        };
        validate_key(key)?;
        validate_value(value)?;

        let found = scan_range(&lines, bounds, key);
        let target = found.unwrap_or(bounds.end);
        let entry = entry_line(key, value);
        if target >= lines.len() {
            lines.push(entry);
        } else if found.is_some() {
            lines[target] = entry;
        } else {
            lines.insert(target, entry);
        }

        lock.rewrite(&lines)?;
        self.index.patch_after_write(target);
        self.line_count = lines.len();
        debug!(
            db = %self.name,
            table,
            line = target,
            updated = found.is_some(),
            "wrote entry"
        );
        Ok(())
    }
}

/// First line inside `bounds` that stores `key`.
fn scan_range(lines: &[String], bounds: TableBounds, key: &str) -> Option<usize> {
    let end = bounds.end.min(lines.len());
    (bounds.start..end).find(|&at| matches_key(key, &lines[at]))
}

/// Rebuilds the index when the store no longer has the line count it describes.
///
/// Table bounds only move when lines are added, so an unchanged count means
/// nobody else created a table or inserted an entry since the last operation.
fn refresh_index(
    index: &mut TableIndex,
    line_count: &mut usize,
    lines: &[String],
    path: &Path,
) -> Result<(), Error> {
    if lines.len() == *line_count {
        return Ok(());
    }
    warn!(
        path = %path.display(),
        expected = *line_count,
        found = lines.len(),
        "backing store changed outside this handle; reindexing"
    );
    *index = build_index(lines).map_err(|err| err.with_path(path))?;
    *line_count = lines.len();
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

//! Purpose: Track where each table's entries live inside a backing store.
//! Exports: `TableBounds`, `TableIndex`, `build_index`.
//! Role: Built once by scanning all lines, then patched after each write.
//! Invariants: Bounds are half-open `[start, end)` with `start <= end`.
//! Invariants: Ranges of distinct tables never overlap.

use std::collections::BTreeMap;

use crate::core::error::Error;
use crate::core::format::{is_marker, parse_marker};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct TableBounds {
    pub start: usize,
    pub end: usize,
}

impl TableBounds {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    /// Empty table starting at `at`.
    pub fn empty(at: usize) -> Self {
        Self::new(at, at)
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TableIndex {
    tables: BTreeMap<String, TableBounds>,
}

impl TableIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<TableBounds> {
        self.tables.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, bounds: TableBounds) {
        self.tables.insert(name.into(), bounds);
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, TableBounds)> {
        self.tables.iter().map(|(name, bounds)| (name.as_str(), *bounds))
    }

    /// Account for a write that targeted line `at`.
    ///
    /// A table ending exactly at `at` just received the new line and grows by
    /// one; when that happens every table located past the new line moves
    /// forward by one. Runs after in-place updates too, where no table ends at
    /// `at` and nothing changes.
    pub fn patch_after_write(&mut self, at: usize) {
        let mut grown = false;
        for bounds in self.tables.values_mut() {
            if bounds.end == at {
                bounds.end += 1;
                grown = true;
            }
        }
        if !grown {
            return;
        }
        for bounds in self.tables.values_mut() {
            if bounds.end > at + 1 {
                bounds.start += 1;
                bounds.end += 1;
            }
        }
    }
}

/// Scan every line once and recover the bounds of each table.
///
/// An empty line closes the open table; a marker line opens a new one whose
/// entries start on the following line. A table still open at the end of the
/// input closes at the total line count. A repeated marker overwrites the
/// earlier bounds.
pub fn build_index<S: AsRef<str>>(lines: &[S]) -> Result<TableIndex, Error> {
    let mut index = TableIndex::new();
    let mut open: Option<(&str, usize)> = None;

    for (counter, line) in lines.iter().enumerate() {
        let line = line.as_ref();
        if line.is_empty() {
            if let Some((name, start)) = open.take() {
                index.insert(name, TableBounds::new(start, counter));
            }
        } else if is_marker(line) {
            let name = parse_marker(line, counter)?;
            open = Some((name, counter + 1));
        }
    }
    if let Some((name, start)) = open {
        index.insert(name, TableBounds::new(start, lines.len()));
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::{TableBounds, TableIndex, build_index};
    use crate::core::error::ErrorKind;

    #[test]
    fn empty_input_has_no_tables() {
        let lines: Vec<String> = Vec::new();
        let index = build_index(&lines).expect("index");
        assert!(index.is_empty());
    }

    #[test]
    fn scan_recovers_each_region() {
        let lines = ["", "|a|", "k1|v1", "k2|v2", "", "|b|", "", "|c|", "x|y"];
        let index = build_index(&lines).expect("index");
        assert_eq!(index.len(), 3);
        assert_eq!(index.get("a"), Some(TableBounds::new(2, 4)));
        assert_eq!(index.get("b"), Some(TableBounds::new(6, 6)));
        assert_eq!(index.get("c"), Some(TableBounds::new(8, 9)));
        assert_eq!(index.names().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn trailing_table_without_entries_is_empty() {
        let lines = ["", "|a|"];
        let index = build_index(&lines).expect("index");
        assert_eq!(index.get("a"), Some(TableBounds::empty(2)));
    }

    #[test]
    fn duplicate_marker_keeps_last() {
        let lines = ["", "|a|", "k|v", "", "|a|"];
        let index = build_index(&lines).expect("index");
        assert_eq!(index.get("a"), Some(TableBounds::empty(5)));
    }

    #[test]
    fn malformed_marker_is_corrupt() {
        let lines = ["", "|"];
        let err = build_index(&lines).expect_err("corrupt");
        assert_eq!(err.kind(), ErrorKind::Corrupt);
        assert_eq!(err.line(), Some(1));
    }

    #[test]
    fn append_to_earlier_table_shifts_later_ones() {
        let mut index = TableIndex::new();
        index.insert("a", TableBounds::empty(2));
        index.insert("b", TableBounds::empty(4));
        index.patch_after_write(2);
        assert_eq!(index.get("a"), Some(TableBounds::new(2, 3)));
        assert_eq!(index.get("b"), Some(TableBounds::empty(5)));
    }

    #[test]
    fn in_place_update_leaves_bounds_alone() {
        let mut index = TableIndex::new();
        index.insert("a", TableBounds::new(2, 5));
        index.insert("b", TableBounds::new(7, 9));
        let before = index.clone();
        index.patch_after_write(3);
        index.patch_after_write(8);
        assert_eq!(index, before);
    }
}

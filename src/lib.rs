//! Purpose: Library crate behind the `tablekv` CLI and its tests.
//! Exports: `core` (line format, table index, backing store, errors) and `api`
//!          (registry, command parsing and execution).
//! Role: Embedded key/value store multiplexing named tables in one text file per database.
//! Invariants: Core modules prefer explicit inputs/outputs over hidden state.
pub mod api;
pub mod core;
pub mod db_paths;

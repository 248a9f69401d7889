// Core modules implementing the line format, table index, file I/O, and errors.
pub mod database;
pub mod error;
pub mod format;
pub mod index;
pub mod store;

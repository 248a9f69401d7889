//! Purpose: Define the public Rust API boundary for tablekv.
//! Exports: Core types plus the registry and command layer used by the CLI.
//! Role: Public, additive-only surface over the storage engine.
//! Invariants: Command execution never panics or propagates errors; failures become results.

mod command;
mod registry;
mod result;

#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::database::Database;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::index::TableBounds;
pub use command::{DatabaseCommand, WRONG_ARGUMENTS, execute_command, execute_line, parse_command};
pub use registry::Registry;
pub use result::{CommandResult, result_json};

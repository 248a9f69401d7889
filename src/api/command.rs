//! Purpose: Parse command text into a tagged operation and execute it.
//! Exports: `DatabaseCommand`, `parse_command`, `execute_command`, `execute_line`.
//! Role: The only bridge between the text protocol and the storage engine.
//! Invariants: Argument counts are checked while parsing, never during execution.
//! Invariants: Execution converts every error into `CommandResult::Failure`.
#![allow(clippy::result_large_err)]

use tracing::debug;

use super::registry::Registry;
use super::result::CommandResult;
use crate::core::error::{Error, ErrorKind};

pub const WRONG_ARGUMENTS: &str = "Wrong arguments count.";

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DatabaseCommand {
    CreateDatabase {
        database: String,
    },
    CreateTable {
        database: String,
        table: String,
    },
    ReadKey {
        database: String,
        table: String,
        key: String,
    },
    UpdateKey {
        database: String,
        table: String,
        key: String,
        value: String,
    },
}

impl DatabaseCommand {
    pub fn keyword(&self) -> &'static str {
        match self {
            DatabaseCommand::CreateDatabase { .. } => "CREATE_DATABASE",
            DatabaseCommand::CreateTable { .. } => "CREATE_TABLE",
            DatabaseCommand::ReadKey { .. } => "READ_KEY",
            DatabaseCommand::UpdateKey { .. } => "UPDATE_KEY",
        }
    }

    pub fn database(&self) -> &str {
        match self {
            DatabaseCommand::CreateDatabase { database }
            | DatabaseCommand::CreateTable { database, .. }
            | DatabaseCommand::ReadKey { database, .. }
            | DatabaseCommand::UpdateKey { database, .. } => database,
        }
    }
}

/// Splits `input` on single spaces and matches keyword plus exact arity.
///
/// Trailing empty tokens are dropped, so `READ_KEY db t ` has two arguments;
/// interior empty tokens are kept as empty arguments.
pub fn parse_command(input: &str) -> Result<DatabaseCommand, Error> {
    let mut tokens: Vec<&str> = input.split(' ').collect();
    while tokens.last().is_some_and(|token| token.is_empty()) {
        tokens.pop();
    }

    let command = match tokens.as_slice() {
        ["CREATE_DATABASE", database] => DatabaseCommand::CreateDatabase {
            database: database.to_string(),
        },
        ["CREATE_TABLE", database, table] => DatabaseCommand::CreateTable {
            database: database.to_string(),
            table: table.to_string(),
        },
        ["READ_KEY", database, table, key] => DatabaseCommand::ReadKey {
            database: database.to_string(),
            table: table.to_string(),
            key: key.to_string(),
        },
        ["UPDATE_KEY", database, table, key, value] => DatabaseCommand::UpdateKey {
            database: database.to_string(),
            table: table.to_string(),
            key: key.to_string(),
            value: value.to_string(),
        },
        _ => {
            return Err(Error::new(ErrorKind::Usage)
                .with_message(WRONG_ARGUMENTS)
                .with_hint(
                    "Use CREATE_DATABASE <db>, CREATE_TABLE <db> <table>, \
                     READ_KEY <db> <table> <key>, or UPDATE_KEY <db> <table> <key> <value>.",
                ));
        }
    };
    Ok(command)
}

pub fn execute_command(registry: &mut Registry, command: &DatabaseCommand) -> CommandResult {
    let result = CommandResult::from(run(registry, command));
    debug!(
        command = command.keyword(),
        db = command.database(),
        ok = result.is_success(),
        "executed command"
    );
    result
}

pub fn execute_line(registry: &mut Registry, line: &str) -> CommandResult {
    match parse_command(line) {
        Ok(command) => execute_command(registry, &command),
        Err(err) => CommandResult::failure(&err),
    }
}

fn run(registry: &mut Registry, command: &DatabaseCommand) -> Result<Option<String>, Error> {
    match command {
        DatabaseCommand::CreateDatabase { database } => {
            registry.create_database(database)?;
            Ok(None)
        }
        DatabaseCommand::CreateTable { database, table } => {
            registry
                .database(database)?
                .create_table_if_not_exists(table)?;
            Ok(None)
        }
        DatabaseCommand::ReadKey {
            database,
            table,
            key,
        } => {
            let db = registry.database(database)?;
            match db.read(table, key)? {
                Some(value) => Ok(Some(value)),
                None if !db.has_table(table) => Err(Error::new(ErrorKind::NotFound)
                    .with_message(format!("table {table} not found in database {database}"))
                    .with_table(table.as_str())),
                None => Err(Error::new(ErrorKind::NotFound)
                    .with_message(format!("key {key} not found in table {table}"))
                    .with_table(table.as_str())),
            }
        }
        DatabaseCommand::UpdateKey {
            database,
            table,
            key,
            value,
        } => {
            registry.database(database)?.write(table, key, value)?;
            Ok(None)
        }
    }
}

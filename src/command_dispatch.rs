//! Purpose: Hold top-level CLI command dispatch for `tablekv`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Typed subcommands and `exec` lines run through the same `DatabaseCommand`.
//! Invariants: A failed command result maps to its kind's exit code.

use super::*;

pub(super) fn dispatch_command(command: Command, db_dir: PathBuf) -> Result<RunOutcome, Error> {
    let mut registry = Registry::new().with_db_dir(db_dir);
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "tablekv", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Version => {
            emit_version_output();
            Ok(RunOutcome::ok())
        }
        Command::Shell => {
            shell::serve(&mut registry)?;
            Ok(RunOutcome::ok())
        }
        Command::Exec { words } => {
            let result = execute_line(&mut registry, &words.join(" "));
            Ok(emit_result(&result))
        }
        Command::CreateTable {
            database,
            table,
            segment_size: Some(segment_size),
        } => {
            let result = CommandResult::from(
                registry
                    .database(&database)
                    .and_then(|db| db.create_table_with_segment_size(&table, segment_size))
                    .map(|()| None),
            );
            Ok(emit_result(&result))
        }
        Command::CreateDatabase { name } => run_typed(
            &mut registry,
            DatabaseCommand::CreateDatabase { database: name },
        ),
        Command::CreateTable {
            database,
            table,
            segment_size: None,
        } => run_typed(&mut registry, DatabaseCommand::CreateTable { database, table }),
        Command::Read {
            database,
            table,
            key,
        } => run_typed(
            &mut registry,
            DatabaseCommand::ReadKey {
                database,
                table,
                key,
            },
        ),
        Command::Update {
            database,
            table,
            key,
            value,
        } => run_typed(
            &mut registry,
            DatabaseCommand::UpdateKey {
                database,
                table,
                key,
                value,
            },
        ),
    }
}

fn run_typed(registry: &mut Registry, command: DatabaseCommand) -> Result<RunOutcome, Error> {
    let result = execute_command(registry, &command);
    Ok(emit_result(&result))
}

fn emit_result(result: &CommandResult) -> RunOutcome {
    emit_json(result_json(result));
    RunOutcome::from_result(result)
}

//! Purpose: `tablekv` CLI entry point.
//! Role: Binary crate root; parses args, runs commands, emits JSON on stdout.
//! Invariants: Every command result is one JSON object on stdout.
//! Invariants: Non-interactive errors are emitted as JSON on stderr; logs go to stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
#![allow(clippy::result_large_err)]
use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand, ValueHint, error::ErrorKind as ClapErrorKind};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use std::error::Error as StdError;
use tracing_subscriber::EnvFilter;

mod command_dispatch;
mod shell;

use tablekv::api::{
    CommandResult, DatabaseCommand, Error, ErrorKind, Registry, execute_command, execute_line,
    result_json, to_exit_code,
};
use tablekv::db_paths::default_db_dir;

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }

    fn from_result(result: &CommandResult) -> Self {
        match result.error_kind() {
            Some(kind) => Self::with_code(to_exit_code(kind)),
            None => Self::ok(),
        }
    }
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, Error> {
    let cli = match Cli::try_parse_from(std::env::args_os()) {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(clap_error_summary(&err))
                    .with_hint("Try `tablekv --help`."));
            }
        },
    };

    let db_dir = cli.dir.unwrap_or_else(default_db_dir);
    command_dispatch::dispatch_command(cli.command, db_dir).map_err(add_io_hint)
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

#[derive(Parser)]
#[command(
    name = "tablekv",
    version,
    about = "Named key/value tables stored in one plain text file per database",
    long_about = None,
    after_help = r#"EXAMPLES
  $ tablekv create-database db1
  $ tablekv create-table db1 users
  $ tablekv update db1 users alice 30
  $ tablekv read db1 users alice
  $ tablekv exec READ_KEY db1 users alice
  $ printf 'CREATE_DATABASE db2\nCREATE_TABLE db2 t\n' | tablekv shell

NOTES
  - Databases live in --dir (default: $TABLEKV_DIR, else the current directory)
  - Set RUST_LOG=debug to trace index maintenance on stderr"#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        help = "Database directory (default: $TABLEKV_DIR or the current directory)",
        value_hint = ValueHint::DirPath
    )]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(
        about = "Run one command line of the text protocol",
        after_help = r#"EXAMPLES
  $ tablekv exec CREATE_DATABASE db1
  $ tablekv exec UPDATE_KEY db1 users alice 30"#
    )]
    Exec {
        #[arg(
            required = true,
            num_args = 1..,
            trailing_var_arg = true,
            allow_hyphen_values = true,
            help = "Keyword and arguments, joined with single spaces"
        )]
        words: Vec<String>,
    },
    #[command(about = "Read command lines from stdin and answer each with one JSON line")]
    Shell,
    #[command(about = "Create a new empty database file")]
    CreateDatabase {
        #[arg(help = "Database name")]
        name: String,
    },
    #[command(about = "Create a table inside a database")]
    CreateTable {
        #[arg(help = "Database name")]
        database: String,
        #[arg(help = "Table name")]
        table: String,
        #[arg(long, help = "Fixed segment size in bytes (not supported yet)")]
        segment_size: Option<u64>,
    },
    #[command(about = "Read the value stored under a key")]
    Read {
        database: String,
        table: String,
        key: String,
    },
    #[command(about = "Insert or overwrite the value stored under a key")]
    Update {
        database: String,
        table: String,
        key: String,
        value: String,
    },
    #[command(about = "Generate shell completions")]
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
    #[command(about = "Print version info")]
    Version,
}

fn emit_json(value: Value) {
    let json = if io::stdout().is_terminal() {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
    .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
    println!("{json}");
}

fn emit_version_output() {
    if io::stdout().is_terminal() {
        println!("tablekv {}", env!("CARGO_PKG_VERSION"));
    } else {
        emit_json(json!({
            "name": "tablekv",
            "version": env!("CARGO_PKG_VERSION"),
        }));
    }
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("{}", error_text(err));
        return;
    }
    let json = serde_json::to_string(&error_json(err)).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_text(err: &Error) -> String {
    let mut lines = vec![format!("error: {}", error_message(err))];
    if let Some(hint) = err.hint() {
        lines.push(format!("hint: {hint}"));
    }
    if let Some(path) = err.path() {
        lines.push(format!("path: {}", path.display()));
    }
    if let Some(cause) = error_causes(err).first() {
        lines.push(format!("caused by: {cause}"));
    }
    lines.join("\n")
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path.display().to_string()));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_message(err: &Error) -> String {
    err.message()
        .map(str::to_owned)
        .unwrap_or_else(|| err.to_string())
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut current = err.source();
    while let Some(source) = current {
        causes.push(source.to_string());
        current = source.source();
    }
    causes
}

fn add_io_hint(err: Error) -> Error {
    if err.hint().is_some() {
        return err;
    }
    match err.kind() {
        ErrorKind::Permission => err.with_hint(
            "Permission denied. Check directory permissions or use --dir to a writable location.",
        ),
        ErrorKind::Busy => err.with_hint("Database is busy (another writer holds the lock)."),
        ErrorKind::Io => err.with_hint("I/O error. Check the path, filesystem, and disk space."),
        ErrorKind::Corrupt => {
            err.with_hint("Database file appears corrupt. Inspect its table markers.")
        }
        _ => err,
    }
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}

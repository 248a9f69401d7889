//! Purpose: Structured outcome of one executed command.
//! Exports: `CommandResult`, `result_json`.
//! Invariants: A result is either a success with an optional payload or a failure
//!             with a message, never both.
//! Invariants: JSON envelope fields are additive-only.
use std::error::Error as StdError;

use serde_json::{Map, Value, json};

use crate::core::error::{Error, ErrorKind};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CommandResult {
    Success(Option<String>),
    Failure { kind: ErrorKind, message: String },
}

impl CommandResult {
    pub fn success(value: Option<String>) -> Self {
        CommandResult::Success(value)
    }

    /// Message is the error's own text followed by each distinct cause.
    pub fn failure(err: &Error) -> Self {
        let mut message = err
            .message()
            .map(str::to_owned)
            .unwrap_or_else(|| err.to_string());
        let mut current = err.source();
        while let Some(source) = current {
            let cause = source.to_string();
            if !message.contains(&cause) {
                message.push_str(": ");
                message.push_str(&cause);
            }
            current = source.source();
        }
        CommandResult::Failure {
            kind: err.kind(),
            message,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CommandResult::Success(_))
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            CommandResult::Success(value) => value.as_deref(),
            CommandResult::Failure { .. } => None,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            CommandResult::Success(_) => None,
            CommandResult::Failure { kind, .. } => Some(*kind),
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            CommandResult::Success(_) => None,
            CommandResult::Failure { message, .. } => Some(message),
        }
    }
}

impl From<Result<Option<String>, Error>> for CommandResult {
    fn from(result: Result<Option<String>, Error>) -> Self {
        match result {
            Ok(value) => CommandResult::success(value),
            Err(err) => CommandResult::failure(&err),
        }
    }
}

pub fn result_json(result: &CommandResult) -> Value {
    match result {
        CommandResult::Success(value) => json!({ "ok": true, "value": value }),
        CommandResult::Failure { kind, message } => {
            let mut inner = Map::new();
            inner.insert("kind".to_string(), json!(format!("{kind:?}")));
            inner.insert("message".to_string(), json!(message));
            json!({ "ok": false, "error": Value::Object(inner) })
        }
    }
}

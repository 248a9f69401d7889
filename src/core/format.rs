//! Purpose: Define the text line format of a backing store.
//! Exports: `SEPARATOR`, `LINE_TERMINATOR`, line encoders/decoders, the key predicate,
//!          and validators for table names, keys, and values.
//! Invariants: A marker line is `|name|`; an entry line is `key|value`.
//! Invariants: Keys never contain the separator; values may.

use crate::core::error::{Error, ErrorKind};

pub const SEPARATOR: char = '|';

#[cfg(windows)]
pub const LINE_TERMINATOR: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_TERMINATOR: &str = "\n";

pub fn entry_line(key: &str, value: &str) -> String {
    format!("{key}{SEPARATOR}{value}")
}

/// Bytes appended to a store to open a new table region.
pub fn marker_block(table: &str) -> String {
    format!("{LINE_TERMINATOR}{SEPARATOR}{table}{SEPARATOR}{LINE_TERMINATOR}")
}

pub fn is_marker(line: &str) -> bool {
    line.starts_with(SEPARATOR)
}

/// Extracts the table name from a marker line.
///
/// `line_no` is only used to annotate the error.
pub fn parse_marker(line: &str, line_no: usize) -> Result<&str, Error> {
    let name = line
        .strip_prefix(SEPARATOR)
        .and_then(|rest| rest.strip_suffix(SEPARATOR))
        .filter(|name| !name.is_empty());
    name.ok_or_else(|| {
        Error::new(ErrorKind::Corrupt)
            .with_message(format!("malformed table marker {line:?}"))
            .with_line(line_no as u64)
    })
}

/// True when `line` stores `key`: the key is a literal prefix and the very next
/// character is the separator. `user` never matches `user1|...`.
pub fn matches_key(key: &str, line: &str) -> bool {
    line.len() > key.len()
        && line.starts_with(key)
        && line.as_bytes()[key.len()] == SEPARATOR as u8
}

/// Value half of an entry line already known to match `key`.
pub fn entry_value<'a>(key: &str, line: &'a str) -> &'a str {
    &line[key.len() + SEPARATOR.len_utf8()..]
}

pub fn validate_table_name(name: &str) -> Result<(), Error> {
    validate_token("table name", name, false)
}

pub fn validate_key(key: &str) -> Result<(), Error> {
    validate_token("key", key, false)
}

pub fn validate_value(value: &str) -> Result<(), Error> {
    validate_token("value", value, true)
}

fn validate_token(label: &str, token: &str, allow_separator: bool) -> Result<(), Error> {
    if token.contains(['\n', '\r']) {
        return Err(Error::new(ErrorKind::Usage)
            .with_message(format!("{label} must not contain line breaks")));
    }
    if allow_separator {
        return Ok(());
    }
    if token.is_empty() {
        return Err(Error::new(ErrorKind::Usage).with_message(format!("{label} must not be empty")));
    }
    if token.contains(SEPARATOR) {
        return Err(Error::new(ErrorKind::Usage)
            .with_message(format!("{label} must not contain '{SEPARATOR}'"))
            .with_hint("The separator is reserved for the file format."));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_match_requires_separator_after_prefix() {
        assert!(matches_key("user", "user|1"));
        assert!(!matches_key("user", "user1|2"));
        assert!(!matches_key("user", "user"));
        assert!(!matches_key("user1", "user|1"));
        assert!(matches_key("k", "k|"));
    }

    #[test]
    fn entry_value_may_contain_separator() {
        let line = entry_line("path", "a|b|c");
        assert!(matches_key("path", &line));
        assert_eq!(entry_value("path", &line), "a|b|c");
    }

    #[test]
    fn marker_round_trip_and_corruption() {
        assert_eq!(parse_marker("|users|", 1).expect("marker"), "users");
        for bad in ["|", "||", "|users"] {
            let err = parse_marker(bad, 7).expect_err("corrupt");
            assert_eq!(err.kind(), ErrorKind::Corrupt);
            assert_eq!(err.line(), Some(7));
        }
        let block = marker_block("t");
        assert!(block.starts_with(LINE_TERMINATOR));
        assert!(block.ends_with(LINE_TERMINATOR));
    }

    #[test]
    fn validation_rules() {
        assert!(validate_key("alice").is_ok());
        assert_eq!(validate_key("").unwrap_err().kind(), ErrorKind::Usage);
        assert_eq!(validate_key("a|b").unwrap_err().kind(), ErrorKind::Usage);
        assert_eq!(validate_table_name("t\n").unwrap_err().kind(), ErrorKind::Usage);
        assert!(validate_value("").is_ok());
        assert!(validate_value("x|y").is_ok());
        assert_eq!(validate_value("x\ny").unwrap_err().kind(), ErrorKind::Usage);
    }
}

//! Purpose: Run the command text protocol over stdio.
//! Exports: `serve`.
//! Role: Read one command per stdin line, answer each with one JSON line on stdout.
//! Invariants: stdout only carries result envelopes (one JSON value per line).
//! Invariants: stdin EOF exits cleanly; blank lines are skipped without output.
//! Invariants: One registry serves the whole session, so databases load once.

use std::io::{self, BufRead, BufReader, BufWriter, Write};

use serde_json::Value;
use tablekv::api::{Error, ErrorKind, Registry, execute_line, result_json};

pub(super) fn serve(registry: &mut Registry) -> Result<(), Error> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut reader = BufReader::new(stdin.lock());
    let mut writer = BufWriter::new(stdout.lock());
    let mut line = String::new();

    loop {
        line.clear();
        let read = reader.read_line(&mut line).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to read command")
                .with_source(err)
        })?;
        if read == 0 {
            return writer.flush().map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("failed to flush output")
                    .with_source(err)
            });
        }

        let command = line.trim_end_matches(['\n', '\r']);
        if command.trim().is_empty() {
            continue;
        }

        let result = execute_line(registry, command);
        write_json_line(&mut writer, &result_json(&result))?;
    }
}

fn write_json_line(
    writer: &mut BufWriter<io::StdoutLock<'_>>,
    payload: &Value,
) -> Result<(), Error> {
    serde_json::to_writer(&mut *writer, payload).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to encode result")
            .with_source(err)
    })?;
    writer.write_all(b"\n").map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to write result")
            .with_source(err)
    })?;
    writer.flush().map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to flush result")
            .with_source(err)
    })
}

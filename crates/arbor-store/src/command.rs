use std::fmt;
use std::io::BufRead;

use arbor_types::Value;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// A state transition request.
///
/// Encoded in JSON as `{"type": "write", "data": ...}`,
/// `{"type": "overwrite", "data": ...}` or `{"type": "reset"}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Command {
    /// Merge the payload into the current state.
    Write(Value),
    /// Replace the current state with the payload, bypassing merge.
    Overwrite(Value),
    /// Reinstall the initial state.
    Reset,
}

/// Discriminant of a [`Command`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    Write,
    Overwrite,
    Reset,
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Write(_) => CommandKind::Write,
            Command::Overwrite(_) => CommandKind::Overwrite,
            Command::Reset => CommandKind::Reset,
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandKind::Write => write!(f, "write"),
            CommandKind::Overwrite => write!(f, "overwrite"),
            CommandKind::Reset => write!(f, "reset"),
        }
    }
}

/// Read a command log: one JSON command per line.
///
/// Blank lines and lines starting with `#` are skipped. Line numbers in
/// errors are 1-based.
pub fn read_commands(reader: impl BufRead) -> StoreResult<Vec<Command>> {
    let mut commands = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let command = serde_json::from_str(trimmed).map_err(|source| {
            StoreError::InvalidCommand {
                line: idx + 1,
                source,
            }
        })?;
        commands.push(command);
    }
    Ok(commands)
}

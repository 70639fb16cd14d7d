//! Log records: the only thing mm ever persists.

use std::{collections::BTreeSet, path::PathBuf};

use jiff::Timestamp;

/// One entry in the `.mm` log.
///
/// Records are appended in execution order and never rewritten.
/// Paths are relative to the log root unless they lie outside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogRecord {
    /// A tracked file was renamed with `mm mv`.
    Move(MoveRecord),

    /// A command ran and wrote at least one file.
    Command(CommandRecord),
}

/// A rename event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    pub src: PathBuf,
    pub dst: PathBuf,
}

/// One observed command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRecord {
    /// Full shell command text.
    pub cmd: String,

    /// The program or script label.
    pub script: PathBuf,

    pub started_at: Timestamp,
    pub ended_at: Timestamp,

    /// Working directory the command ran in, relative to the root.
    pub cwd: PathBuf,

    /// Files the command read.
    pub inputs: BTreeSet<PathBuf>,

    /// Files the command wrote, in detection order.
    pub outputs: Vec<PathBuf>,
}

impl LogRecord {
    /// The `TYPE` tag written for this record.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Move(_) => "MV",
            Self::Command(_) => "CMD",
        }
    }
}

//! `mm mv`: move a file and record the rename.

use std::{
    path::{Path, PathBuf},
    process::Command,
};

use crate::{
    model::{LogRecord, MoveRecord},
    storage::Storage,
};

pub(super) fn cmd_move(storage: &Storage, src: &Path, dst: &Path) -> Result<(), String> {
    // Resolve the destination name before moving: afterwards a directory
    // target can no longer be told apart from a renamed directory.
    let record = MoveRecord {
        src: storage.normalize(src),
        dst: destination_name(storage, src, dst),
    };

    eprintln!("mv {} {}", src.display(), dst.display());
    let status = Command::new("mv")
        .arg(src)
        .arg(dst)
        .current_dir(storage.cwd())
        .status()
        .map_err(|e| format!("failed to run mv: {e}"))?;
    if !status.success() {
        return Err(format!("mv failed ({status}); nothing recorded"));
    }

    storage
        .append(&LogRecord::Move(record))
        .map_err(|e| format!("failed to record move: {e}"))
}

/// Where `src` ends up: inside `dst` when it is an existing directory.
fn destination_name(storage: &Storage, src: &Path, dst: &Path) -> PathBuf {
    match src.file_name() {
        Some(file) if storage.cwd().join(dst).is_dir() => storage.normalize(dst.join(file)),
        _ => storage.normalize(dst),
    }
}

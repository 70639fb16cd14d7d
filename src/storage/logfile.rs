//! Log file storage: append and load records.
//!
//! Each record is a block of `KEY=VALUE` lines. Blocks are separated by
//! blank lines and list values are joined with single spaces. Lines starting
//! with `#` are comments.

use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use fs2::FileExt;
use jiff::{Timestamp, civil, tz::TimeZone};
use tracing::{debug, info};

use crate::model::{CommandRecord, LogRecord, MoveRecord};

use super::{Result, Storage, StorageError};

impl Storage {
    /// Appends one record to the end of the log.
    ///
    /// The block is written with a single `write_all` while holding an
    /// exclusive lock on the log, so a failed append leaves earlier records
    /// intact and concurrent appends do not interleave.
    pub fn append(&self, record: &LogRecord) -> Result<()> {
        let block = encode_record(record)?;
        let mut file = fs::OpenOptions::new()
            .append(true)
            .open(self.log_path())?;
        FileExt::lock_exclusive(&file)?;
        file.write_all(block.as_bytes())?;
        info!(kind = record.tag(), "appended record");
        Ok(())
    }

    /// Loads every record in the log, in append order.
    ///
    /// A missing log file reads as empty. Any malformed block aborts the
    /// whole load.
    pub fn load(&self) -> Result<Vec<LogRecord>> {
        let text = match fs::read_to_string(self.log_path()) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let records = parse_records(&text)?;
        debug!(count = records.len(), "loaded log");
        Ok(records)
    }
}

/// Serializes a record as a blank line followed by its `KEY=VALUE` block.
fn encode_record(record: &LogRecord) -> Result<String> {
    let mut block = String::from("\n");
    push_field(&mut block, "TYPE", record.tag())?;
    match record {
        LogRecord::Move(mv) => {
            push_field(&mut block, "SRC", &path_value("SRC", &mv.src)?)?;
            push_field(&mut block, "DST", &path_value("DST", &mv.dst)?)?;
        }
        LogRecord::Command(cmd) => {
            push_field(&mut block, "START", &cmd.started_at.to_string())?;
            push_field(&mut block, "END", &cmd.ended_at.to_string())?;
            push_field(&mut block, "CWD", &path_value("CWD", &cmd.cwd)?)?;
            push_field(&mut block, "CMD", &cmd.cmd)?;
            push_field(&mut block, "SCRIPT", &path_value("SCRIPT", &cmd.script)?)?;
            push_field(&mut block, "IN", &list_value("IN", &cmd.inputs)?)?;
            push_field(&mut block, "OUT", &list_value("OUT", &cmd.outputs)?)?;
        }
    }
    Ok(block)
}

fn push_field(block: &mut String, key: &'static str, value: &str) -> Result<()> {
    if value.contains(['\n', '\r']) {
        return Err(StorageError::InvalidValue {
            key,
            value: value.to_string(),
        });
    }
    block.push_str(key);
    block.push('=');
    block.push_str(value);
    block.push('\n');
    Ok(())
}

fn path_value(key: &'static str, path: &Path) -> Result<String> {
    let value = path.to_string_lossy();
    // Leading or trailing whitespace would be trimmed away on read.
    if value.trim() != value || value.is_empty() {
        return Err(StorageError::InvalidValue {
            key,
            value: value.into_owned(),
        });
    }
    Ok(value.into_owned())
}

/// Joins list entries with spaces. Entries containing whitespace would split
/// on read, so they are refused.
fn list_value<'a>(
    key: &'static str,
    paths: impl IntoIterator<Item = &'a PathBuf>,
) -> Result<String> {
    let mut values = Vec::new();
    for path in paths {
        let value = path.to_string_lossy();
        if value.is_empty() || value.contains(char::is_whitespace) {
            return Err(StorageError::InvalidValue {
                key,
                value: value.into_owned(),
            });
        }
        values.push(value.into_owned());
    }
    Ok(values.join(" "))
}

/// RFC 3339 first. Older logs hold local wall-clock times without an offset,
/// such as `2024-01-01 12:00:00.123456`.
fn parse_timestamp(value: &str) -> core::result::Result<Timestamp, jiff::Error> {
    value.parse::<Timestamp>().or_else(|strict| {
        value
            .parse::<civil::DateTime>()
            .and_then(|dt| dt.to_zoned(TimeZone::system()))
            .map(|zoned| zoned.timestamp())
            .map_err(|_| strict)
    })
}

/// Fields of one block, with the line the block starts on.
struct Block {
    line: usize,
    fields: BTreeMap<String, String>,
}

/// Parses the full text of a log.
fn parse_records(text: &str) -> Result<Vec<LogRecord>> {
    let mut records = Vec::new();
    let mut block: Option<Block> = None;

    for (index, line) in text.lines().enumerate() {
        let number = index + 1;
        if line.starts_with('#') {
            continue;
        }
        if line.trim().is_empty() {
            if let Some(done) = block.take() {
                records.push(done.into_record()?);
            }
            continue;
        }
        let (key, value) = line.split_once('=').ok_or_else(|| StorageError::CorruptRecord {
            line: number,
            reason: format!("expected KEY=VALUE, found {line:?}"),
        })?;
        block
            .get_or_insert_with(|| Block {
                line: number,
                fields: BTreeMap::new(),
            })
            .fields
            .insert(key.trim().to_string(), value.trim().to_string());
    }

    if let Some(done) = block {
        records.push(done.into_record()?);
    }
    Ok(records)
}

impl Block {
    fn into_record(mut self) -> Result<LogRecord> {
        let tag = self.take("TYPE")?;
        match tag.as_str() {
            "MV" => Ok(LogRecord::Move(MoveRecord {
                src: self.take("SRC")?.into(),
                dst: self.take("DST")?.into(),
            })),
            "CMD" => Ok(LogRecord::Command(CommandRecord {
                started_at: self.timestamp("START")?,
                ended_at: self.timestamp("END")?,
                cwd: self.take("CWD")?.into(),
                cmd: self.take("CMD")?,
                script: self.take("SCRIPT")?.into(),
                inputs: self.list("IN").into_iter().collect::<BTreeSet<_>>(),
                outputs: self.list("OUT"),
            })),
            other => Err(self.corrupt(format!("unknown TYPE {other:?}"))),
        }
    }

    fn take(&mut self, key: &str) -> Result<String> {
        self.fields
            .remove(key)
            .ok_or_else(|| self.corrupt(format!("missing {key}")))
    }

    fn timestamp(&mut self, key: &str) -> Result<Timestamp> {
        let value = self.take(key)?;
        parse_timestamp(&value).map_err(|e| self.corrupt(format!("invalid {key} {value:?}: {e}")))
    }

    /// A missing list key reads as an empty list.
    fn list(&mut self, key: &str) -> Vec<PathBuf> {
        let value = self.fields.remove(key).unwrap_or_default();
        value.split_whitespace().map(PathBuf::from).collect()
    }

    fn corrupt(&self, reason: String) -> StorageError {
        StorageError::CorruptRecord {
            line: self.line,
            reason,
        }
    }
}

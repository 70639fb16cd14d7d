//! Local persistence for the provenance log.
//!
//! A tracked tree is any directory holding a `.mm` file. Everything mm knows
//! lives in that one file, plus an optional `.mmconfig` beside it:
//!
//! ```text
//! <root>/
//!   .mm         # Append-only provenance log
//!   .mmconfig   # Optional TOML configuration
//! ```
//!
//! Paths recorded in the log are relative to `<root>` when they lie inside
//! it and absolute otherwise.

mod logfile;

use std::{
    fs, io,
    path::{Component, Path, PathBuf},
};

use tracing::debug;

/// Name of the log file that marks a root directory.
pub const LOG_FILE: &str = ".mm";

/// Name of the optional configuration file beside the log.
pub const CONFIG_FILE: &str = ".mmconfig";

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error(".mm was not detected in {} or any parent directory. Initialize with `mm init`", .start.display())]
    LogNotFound { start: PathBuf },

    #[error(".mm already exists at {}", .0.display())]
    LogAlreadyExists(PathBuf),

    #[error("corrupt record at line {line}: {reason}")]
    CorruptRecord { line: usize, reason: String },

    #[error("value for {key} cannot be written to the log: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = core::result::Result<T, StorageError>;

/// Handle on a discovered log root.
///
/// Carries the invocation's working directory so that user-supplied paths
/// can be mapped into log coordinates.
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
    cwd: PathBuf,
}

impl Storage {
    /// Finds the log by searching `cwd` and then each parent directory.
    pub fn discover(cwd: impl Into<PathBuf>) -> Result<Self> {
        let cwd = cwd.into();
        let root = cwd
            .ancestors()
            .find(|dir| dir.join(LOG_FILE).is_file())
            .map(Path::to_path_buf)
            .ok_or_else(|| StorageError::LogNotFound { start: cwd.clone() })?;
        debug!(root = %root.display(), "discovered log root");
        Ok(Self { root, cwd })
    }

    /// Creates an empty log in `dir`.
    ///
    /// Fails if a log already exists at exactly that path. A log in a parent
    /// directory is not a conflict: nested roots are allowed.
    pub fn init(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        let path = dir.join(LOG_FILE);
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(StorageError::LogAlreadyExists(path));
            }
            Err(e) => return Err(e.into()),
        }
        Ok(Self {
            root: dir.clone(),
            cwd: dir,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn log_path(&self) -> PathBuf {
        self.root.join(LOG_FILE)
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    /// Maps a user-supplied path into log coordinates.
    ///
    /// Relative paths are taken from the working directory. The result is
    /// relative to the root when it lies inside it, absolute otherwise, and
    /// `.` for the root itself. Normalization is lexical: symlinks are not
    /// resolved and the path need not exist.
    pub fn normalize(&self, path: impl AsRef<Path>) -> PathBuf {
        let absolute = lexical_clean(&self.cwd.join(path));
        match absolute.strip_prefix(&self.root) {
            Ok(rel) if rel.as_os_str().is_empty() => PathBuf::from("."),
            Ok(rel) => rel.to_path_buf(),
            Err(_) => absolute,
        }
    }

    /// Maps a name in log coordinates back to a filesystem path.
    pub fn resolve(&self, name: impl AsRef<Path>) -> PathBuf {
        self.root.join(name)
    }
}

/// Collapses `.` and `..` components without touching the filesystem.
fn lexical_clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

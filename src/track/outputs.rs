//! Output detection: files modified while the command ran.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use jiff::Timestamp;
use tracing::debug;

/// Filesystem timestamps are coarse on some systems, so the window is widened
/// by this much on both sides.
const SLACK_MILLIS: i64 = 1_000;

/// The wall-clock span of one command execution.
#[derive(Debug, Clone, Copy)]
pub struct Window {
    pub started_at: Timestamp,
    pub ended_at: Timestamp,
}

impl Window {
    /// Whether a modification time falls inside the widened window.
    pub fn contains(&self, modified: Timestamp) -> bool {
        let t = modified.as_millisecond();
        let lower = self.started_at.as_millisecond().saturating_sub(SLACK_MILLIS);
        let upper = self.ended_at.as_millisecond().saturating_add(SLACK_MILLIS);
        lower <= t && t <= upper
    }
}

/// Walks `root` and returns every regular file modified within `window`.
///
/// Hidden files and directories are skipped (the log itself is hidden).
/// Ignore files are not consulted: a gitignored output is still an output.
/// Results are in walk order, sorted by name within each directory.
pub fn scan(root: &Path, window: &Window) -> Vec<PathBuf> {
    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .hidden(true)
        .sort_by_file_name(Ord::cmp)
        .build();

    let mut outputs = Vec::new();
    for entry in walker.flatten() {
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        let modified = entry
            .metadata()
            .ok()
            .and_then(|m| m.modified().ok())
            .and_then(|t| Timestamp::try_from(t).ok());
        if modified.is_some_and(|t| window.contains(t)) {
            outputs.push(entry.into_path());
        }
    }
    debug!(root = %root.display(), count = outputs.len(), "scanned for outputs");
    outputs
}

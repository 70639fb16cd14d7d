//! Lookups over a built graph.

use std::path::Path;

use super::{GraphError, ProvenanceGraph, Probe, ScriptId};

impl ProvenanceGraph {
    /// The script that produced the current version of `name`.
    ///
    /// `name` must already be in log coordinates. A file that is not on disk
    /// is an error even when the log knows it, so stale provenance is never
    /// reported as live. Unbound names and raw inputs have no parent.
    pub fn find_parent(
        &self,
        name: &Path,
        probe: &impl Probe,
    ) -> Result<Option<ScriptId>, GraphError> {
        if !probe.exists(name) {
            return Err(GraphError::NotFound(name.to_path_buf()));
        }
        Ok(self.lookup(name).and_then(|id| self.data(id).producer))
    }
}

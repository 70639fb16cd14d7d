//! Staleness: compare the replayed graph against what is on disk.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use tracing::debug;

use super::{DataId, ProvenanceGraph};

/// Answers whether a name in log coordinates exists right now.
pub trait Probe {
    fn exists(&self, name: &Path) -> bool;
}

impl<F: Fn(&Path) -> bool> Probe for F {
    fn exists(&self, name: &Path) -> bool {
        self(name)
    }
}

/// Probes the real filesystem, resolving relative names against the root.
#[derive(Debug, Clone)]
pub struct DiskProbe {
    root: PathBuf,
}

impl DiskProbe {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Probe for DiskProbe {
    fn exists(&self, name: &Path) -> bool {
        // Joining an absolute name replaces the root.
        self.root.join(name).exists()
    }
}

/// How a live data version relates to the file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Current binding, file exists.
    Present,

    /// Superseded by a later write or rename.
    Retired,

    /// Current binding, but the file is gone.
    Missing,
}

/// A graph whose live data has been checked against the filesystem.
#[derive(Debug, Clone)]
pub struct AnnotatedGraph {
    graph: ProvenanceGraph,
    presence: BTreeMap<DataId, Presence>,
}

impl AnnotatedGraph {
    pub fn graph(&self) -> &ProvenanceGraph {
        &self.graph
    }

    /// Presence of a live data version. Pruned data has none.
    pub fn presence(&self, id: DataId) -> Option<Presence> {
        self.presence.get(&id).copied()
    }
}

/// Probes every live data version.
///
/// Retired versions stay retired whatever the probe says; current versions
/// are `Present` or `Missing` depending on the probe alone.
pub fn resolve(graph: ProvenanceGraph, probe: &impl Probe) -> AnnotatedGraph {
    let presence: BTreeMap<DataId, Presence> = graph
        .live_data()
        .map(|id| {
            let data = graph.data(id);
            let state = if !data.exists {
                Presence::Retired
            } else if probe.exists(&data.name) {
                Presence::Present
            } else {
                Presence::Missing
            };
            (id, state)
        })
        .collect();

    debug!(
        missing = presence.values().filter(|p| **p == Presence::Missing).count(),
        retired = presence.values().filter(|p| **p == Presence::Retired).count(),
        "probed live data"
    );

    AnnotatedGraph { graph, presence }
}

//! Provenance graph: the log replayed into data and scripts.
//!
//! Data and scripts live in two arenas addressed by [`DataId`] and
//! [`ScriptId`]. Every cross-reference is an index, and the name binding
//! table maps each current path to the data it refers to. Renames and
//! supersessions only ever touch the table and the `exists` flag.
//!
//! The graph is rebuilt from the full log on every invocation.

mod dot;
mod query;
mod staleness;

use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
};

use jiff::Timestamp;
use tracing::debug;

use crate::model::{CommandRecord, LogRecord, MoveRecord};

pub use dot::export;
pub use staleness::{AnnotatedGraph, DiskProbe, Presence, Probe, resolve};

/// Errors from graph queries.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("no such file: {}", .0.display())]
    NotFound(PathBuf),
}

/// Index of a [`Data`] in its graph's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DataId(usize);

/// Index of a [`Script`] in its graph's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScriptId(usize);

impl DataId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl ScriptId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One version of a named artifact.
///
/// Writing a new output under an existing name creates a new `Data` and
/// retires the old one; renaming keeps the same `Data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Data {
    /// Current name, updated by renames.
    pub name: PathBuf,

    /// The script that wrote this version, or `None` for a raw input.
    pub producer: Option<ScriptId>,

    /// False once a later write or rename superseded this version.
    pub exists: bool,
}

/// One recorded command execution. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    /// Program or script name.
    pub label: PathBuf,

    /// Full shell command text.
    pub cmd: String,

    /// Data bound to the input names when the command ran.
    pub inputs: BTreeSet<DataId>,

    /// Data created by this command, in output order.
    pub outputs: Vec<DataId>,

    pub started_at: Timestamp,
    pub ended_at: Timestamp,
    pub cwd: PathBuf,
}

/// The replayed log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvenanceGraph {
    data: Vec<Data>,
    scripts: Vec<Script>,
    bindings: BTreeMap<PathBuf, DataId>,
    live_scripts: BTreeSet<ScriptId>,
    live_data: BTreeSet<DataId>,
}

impl ProvenanceGraph {
    /// Replays records in log order.
    pub fn build(records: &[LogRecord]) -> Self {
        let mut graph = Self::default();
        for record in records {
            match record {
                LogRecord::Move(mv) => graph.apply_move(mv),
                LogRecord::Command(cmd) => graph.apply_command(cmd),
            }
        }
        graph.prune();
        debug!(
            records = records.len(),
            data = graph.data.len(),
            scripts = graph.scripts.len(),
            live_data = graph.live_data.len(),
            live_scripts = graph.live_scripts.len(),
            "replayed log"
        );
        graph
    }

    pub fn data(&self, id: DataId) -> &Data {
        &self.data[id.0]
    }

    pub fn script(&self, id: ScriptId) -> &Script {
        &self.scripts[id.0]
    }

    /// The data currently bound to `name`, if any.
    pub fn lookup(&self, name: &Path) -> Option<DataId> {
        self.bindings.get(name).copied()
    }

    /// Scripts with at least one current output, in replay order.
    pub fn live_scripts(&self) -> impl Iterator<Item = ScriptId> + '_ {
        self.live_scripts.iter().copied()
    }

    /// Inputs and outputs of live scripts, in replay order.
    pub fn live_data(&self) -> impl Iterator<Item = DataId> + '_ {
        self.live_data.iter().copied()
    }

    pub fn is_live_script(&self, id: ScriptId) -> bool {
        self.live_scripts.contains(&id)
    }

    fn apply_move(&mut self, mv: &MoveRecord) {
        if mv.src == mv.dst {
            return;
        }
        // An untracked source leaves the graph untouched.
        let Some(id) = self.bindings.remove(&mv.src) else {
            return;
        };
        if let Some(overwritten) = self.bindings.insert(mv.dst.clone(), id) {
            self.data[overwritten.0].exists = false;
        }
        self.data[id.0].name.clone_from(&mv.dst);
    }

    fn apply_command(&mut self, cmd: &CommandRecord) {
        let inputs = cmd
            .inputs
            .iter()
            .map(|name| {
                if let Some(&id) = self.bindings.get(name) {
                    id
                } else {
                    let id = self.push_data(name, None);
                    self.bindings.insert(name.clone(), id);
                    id
                }
            })
            .collect();

        let script = ScriptId(self.scripts.len());
        let mut outputs = Vec::with_capacity(cmd.outputs.len());
        for name in &cmd.outputs {
            let id = self.push_data(name, Some(script));
            if let Some(previous) = self.bindings.insert(name.clone(), id) {
                self.data[previous.0].exists = false;
            }
            outputs.push(id);
        }

        self.scripts.push(Script {
            label: cmd.script.clone(),
            cmd: cmd.cmd.clone(),
            inputs,
            outputs,
            started_at: cmd.started_at,
            ended_at: cmd.ended_at,
            cwd: cmd.cwd.clone(),
        });
    }

    fn push_data(&mut self, name: &Path, producer: Option<ScriptId>) -> DataId {
        let id = DataId(self.data.len());
        self.data.push(Data {
            name: name.to_path_buf(),
            producer,
            exists: true,
        });
        id
    }

    /// Keeps scripts with a current output, their inputs, and their outputs.
    fn prune(&mut self) {
        self.live_scripts = self
            .data
            .iter()
            .filter(|d| d.exists)
            .filter_map(|d| d.producer)
            .collect();

        let mut live_data = BTreeSet::new();
        for &script in &self.live_scripts {
            let script = &self.scripts[script.0];
            live_data.extend(script.inputs.iter().copied());
            live_data.extend(script.outputs.iter().copied());
        }
        self.live_data = live_data;
    }
}

#[cfg(test)]
impl ProvenanceGraph {
    pub(crate) fn is_live_data(&self, id: DataId) -> bool {
        self.live_data.contains(&id)
    }

    /// Every data version ever created, live or not.
    pub(crate) fn all_data(&self) -> impl Iterator<Item = (DataId, &Data)> {
        self.data.iter().enumerate().map(|(i, d)| (DataId(i), d))
    }

    /// Every script ever recorded, live or not.
    pub(crate) fn all_scripts(&self) -> impl Iterator<Item = (ScriptId, &Script)> {
        self.scripts.iter().enumerate().map(|(i, s)| (ScriptId(i), s))
    }
}

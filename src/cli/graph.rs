//! Graph queries: visualize and parent.

use std::path::Path;

use crate::{
    graph::{self, AnnotatedGraph, DiskProbe, ProvenanceGraph},
    render,
    storage::Storage,
};

use super::format::format_parent;

/// Load the log and replay it against the current filesystem.
fn load_graph(storage: &Storage, probe: &DiskProbe) -> Result<AnnotatedGraph, String> {
    let records = storage
        .load()
        .map_err(|e| format!("failed to load {}: {e}", storage.log_path().display()))?;
    Ok(graph::resolve(ProvenanceGraph::build(&records), probe))
}

pub(super) fn cmd_visualize(storage: &Storage, output: &Path) -> Result<(), String> {
    let probe = DiskProbe::new(storage.root());
    let annotated = load_graph(storage, &probe)?;
    let dot = graph::export(&annotated);

    let target = storage.cwd().join(output);
    render::write_graph(&dot, &target)
        .map_err(|e| format!("failed to write {}: {e}", target.display()))?;

    eprintln!("Wrote graph to {}", target.display());
    Ok(())
}

pub(super) fn cmd_parent(storage: &Storage, path: &Path) -> Result<(), String> {
    let probe = DiskProbe::new(storage.root());
    let annotated = load_graph(storage, &probe)?;
    let name = storage.normalize(path);

    let parent = annotated
        .graph()
        .find_parent(&name, &probe)
        .map_err(|e| e.to_string())?;

    match parent {
        None => eprintln!("No parent info."),
        Some(script) => {
            for line in format_parent(&annotated, script) {
                eprintln!("{line}");
            }
        }
    }
    Ok(())
}

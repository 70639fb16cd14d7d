//! Output formatting for CLI display.

use crate::{
    graph::{AnnotatedGraph, Presence, ScriptId},
    model::CommandRecord,
};

/// Lines reported after a command is recorded.
pub(super) fn format_record(record: &CommandRecord) -> Vec<String> {
    let mut lines = vec![format!("SCRIPT: {}", record.script.display())];
    lines.extend(
        record
            .inputs
            .iter()
            .map(|input| format!("    IN: {}", input.display())),
    );
    lines.extend(
        record
            .outputs
            .iter()
            .map(|output| format!("   OUT: {}", output.display())),
    );
    lines
}

/// Lines describing the script that produced a file.
pub(super) fn format_parent(annotated: &AnnotatedGraph, script: ScriptId) -> Vec<String> {
    let graph = annotated.graph();
    let script = graph.script(script);

    let mut lines = vec![
        format!("   CMD: {}", script.cmd),
        format!("SCRIPT: {}", script.label.display()),
        format!("   RAN: {} ({})", script.started_at, script.cwd.display()),
    ];
    for &input in &script.inputs {
        let name = graph.data(input).name.display();
        let line = match annotated.presence(input) {
            Some(Presence::Retired) => format!("    IN: {name} (overwritten)"),
            Some(Presence::Missing) => format!("    IN: {name} (removed)"),
            Some(Presence::Present) | None => format!("    IN: {name}"),
        };
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::Path;

    use crate::{
        graph::{ProvenanceGraph, resolve},
        model::LogRecord,
    };

    use crate::graph::tests::command;

    #[test]
    fn format_recorded_command() {
        let LogRecord::Command(record) = command(&["raw.csv"], &["a.csv", "b.csv"], "clean.py")
        else {
            unreachable!()
        };

        assert_eq!(
            format_record(&record),
            [
                "SCRIPT: clean.py",
                "    IN: raw.csv",
                "   OUT: a.csv",
                "   OUT: b.csv",
            ]
        );
    }

    #[test]
    fn format_parent_marks_stale_inputs() {
        let graph = ProvenanceGraph::build(&[
            command(&[], &["a.txt"], "gen.sh"),
            command(&["a.txt", "gone.txt", "raw.txt"], &["b.txt"], "use.sh"),
            command(&[], &["a.txt"], "gen.sh"),
        ]);
        let present = ["a.txt", "b.txt", "raw.txt"];
        let annotated = resolve(graph, &|name: &Path| present.iter().any(|p| name == Path::new(p)));
        let parent = annotated
            .graph()
            .data(annotated.graph().lookup(Path::new("b.txt")).unwrap())
            .producer
            .unwrap();

        let lines = format_parent(&annotated, parent);
        assert_eq!(lines[0], "   CMD: use.sh a.txt gone.txt raw.txt");
        assert_eq!(lines[1], "SCRIPT: use.sh");
        assert!(lines[2].starts_with("   RAN: 2023-11-14T22:13:20Z"));
        assert_eq!(
            &lines[3..],
            [
                "    IN: a.txt (overwritten)",
                "    IN: gone.txt (removed)",
                "    IN: raw.txt",
            ]
        );
    }
}

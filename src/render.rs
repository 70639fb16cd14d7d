//! Image rendering: hand a DOT document to Graphviz.
//!
//! The image format follows the target file's extension. `.dot` and `.gv`
//! targets get the DOT text itself, so no Graphviz install is needed for them.

use std::{
    fs,
    io::{self, Write},
    path::Path,
    process::{Command, ExitStatus, Stdio},
};

/// Errors from writing a graph image.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to run dot (is Graphviz installed?): {0}")]
    Spawn(io::Error),

    #[error("dot failed ({status}): {stderr}")]
    Failed { status: ExitStatus, stderr: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Writes `dot` to `target`, rendering it when the extension asks for an image.
pub fn write_graph(dot: &str, target: &Path) -> Result<(), RenderError> {
    let format = output_format(target);
    if matches!(format.as_str(), "dot" | "gv") {
        fs::write(target, dot)?;
        return Ok(());
    }
    run_dot(dot, &format, target)
}

/// The Graphviz output format for a target path. Defaults to PNG.
fn output_format(target: &Path) -> String {
    target
        .extension()
        .and_then(|e| e.to_str())
        .map_or_else(|| "png".to_string(), str::to_ascii_lowercase)
}

/// Pipe the document into `dot -T<format> -o <target>`.
fn run_dot(dot: &str, format: &str, target: &Path) -> Result<(), RenderError> {
    let mut child = Command::new("dot")
        .arg(format!("-T{format}"))
        .arg("-o")
        .arg(target)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(RenderError::Spawn)?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(dot.as_bytes())?;
    }

    let output = child.wait_with_output()?;
    if !output.status.success() {
        return Err(RenderError::Failed {
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    #[test]
    fn format_follows_extension() {
        assert_eq!(output_format(Path::new("graph.png")), "png");
        assert_eq!(output_format(Path::new("graph.SVG")), "svg");
        assert_eq!(output_format(Path::new("graph")), "png");
    }

    #[test]
    fn dot_target_is_written_verbatim() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("graph.dot");

        write_graph("digraph mm {\n}\n", &target).unwrap();

        assert_eq!(fs::read_to_string(target).unwrap(), "digraph mm {\n}\n");
    }
}

//! CLI interface for mm.
//!
//! `mm` wraps the commands of an ad-hoc data pipeline and records which
//! files each one read and wrote. Reports go to stderr: stdout belongs to
//! the wrapped command.
//!
//! Any argument list that is not an mm subcommand is run and recorded, so
//! `mm python clean.py raw.csv` is the same as `mm run python clean.py raw.csv`.

mod format;
mod graph;
mod rename;
mod track;

use std::{env, path::PathBuf};

use clap::{ArgAction, Parser, Subcommand};

use crate::storage::Storage;

/// Record where your data came from.
#[derive(Debug, Parser)]
#[command(name = "mm", version, after_long_help = WORKFLOW_HELP)]
pub struct Cli {
    /// Log more detail to stderr (`-v` info, `-vv` debug). `MM_LOG` overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

const WORKFLOW_HELP: &str = r#"Workflow:
  1. mm init
  2. mm python scripts/clean.py raw.csv        (or: mm "python scripts/*.py raw.csv")
     → records raw.csv as input, every file written meanwhile as output
  3. mm mv clean.csv final.csv
  4. mm parent final.csv
  5. mm visualize pipeline.svg

Configuration (.mmconfig beside .mm):
  script-dirs = ["scripts"]"#;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create an empty .mm log in the current directory.
    Init,

    /// Run a command and record its inputs and outputs.
    ///
    /// Inputs are arguments that exist on disk. Outputs are files under the
    /// root modified while the command ran. Nothing is recorded if the
    /// command fails or writes nothing.
    Run {
        /// The command and its arguments.
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Draw the provenance graph of current files.
    ///
    /// The image format follows the extension; `.dot` writes Graphviz source.
    #[command(visible_alias = "viz")]
    Visualize {
        /// Output file, relative to the current directory.
        #[arg(default_value = "graph.png")]
        output: PathBuf,
    },

    /// Show the command that produced a file.
    Parent {
        /// A file that currently exists.
        path: PathBuf,
    },

    /// Move a file and record the rename.
    Mv {
        /// Existing file.
        src: PathBuf,

        /// New name or target directory.
        dst: PathBuf,
    },

    /// Any other command line is run and recorded.
    #[command(external_subcommand)]
    External(Vec<String>),
}

/// Run the CLI, returning an error message on failure.
pub fn run(cli: Cli) -> Result<(), String> {
    let cwd = env::current_dir().map_err(|e| format!("failed to read current directory: {e}"))?;

    match cli.command {
        Command::Init => cmd_init(cwd),
        Command::Run { command } | Command::External(command) => {
            let storage = open_storage(cwd)?;
            track::cmd_run(&storage, &command)
        }
        Command::Visualize { output } => graph::cmd_visualize(&open_storage(cwd)?, &output),
        Command::Parent { path } => graph::cmd_parent(&open_storage(cwd)?, &path),
        Command::Mv { src, dst } => rename::cmd_move(&open_storage(cwd)?, &src, &dst),
    }
}

fn cmd_init(cwd: PathBuf) -> Result<(), String> {
    let storage = Storage::init(cwd).map_err(|e| e.to_string())?;
    eprintln!("Created .mm at {}", storage.log_path().display());
    Ok(())
}

/// Find the log above `cwd` and announce where it is.
fn open_storage(cwd: PathBuf) -> Result<Storage, String> {
    let storage = Storage::discover(cwd).map_err(|e| e.to_string())?;
    eprintln!("Root directory is {}", storage.root().display());
    Ok(storage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_command_is_external() {
        let cli = Cli::try_parse_from(["mm", "python", "clean.py", "-n", "3"]).unwrap();

        let Command::External(args) = cli.command else {
            panic!("expected external command");
        };
        assert_eq!(args, ["python", "clean.py", "-n", "3"]);
    }

    #[test]
    fn run_keeps_hyphenated_arguments() {
        let cli = Cli::try_parse_from(["mm", "run", "sort", "-u", "in.txt"]).unwrap();

        let Command::Run { command } = cli.command else {
            panic!("expected run");
        };
        assert_eq!(command, ["sort", "-u", "in.txt"]);
    }

    #[test]
    fn visualize_defaults_to_png() {
        let cli = Cli::try_parse_from(["mm", "viz"]).unwrap();

        let Command::Visualize { output } = cli.command else {
            panic!("expected visualize");
        };
        assert_eq!(output, PathBuf::from("graph.png"));
    }

    #[test]
    fn verbose_counts() {
        let cli = Cli::try_parse_from(["mm", "-vv", "init"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}

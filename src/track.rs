//! Command tracking: run a command and record what it read and wrote.
//!
//! Inputs are the command's arguments that exist on disk before it runs.
//! Outputs are the files under the root whose modification time falls in
//! the command's execution window. The tracker blocks until the command
//! finishes, since the window is only known once it has.

mod args;
mod outputs;

use std::{
    io,
    path::{Path, PathBuf},
    process::{Command, ExitStatus},
};

use jiff::Timestamp;
use tracing::{debug, warn};

use crate::{
    config::Config,
    model::{CommandRecord, LogRecord},
    storage::{Storage, StorageError},
};

use args::{Classified, classify, expand};
use outputs::{Window, scan};

/// Errors from running and recording a command.
#[derive(Debug, thiserror::Error)]
pub enum TrackError {
    #[error("no command given")]
    EmptyCommand,

    #[error("failed to run `{cmd}`: {source}")]
    Spawn { cmd: String, source: io::Error },

    #[error("command failed ({0}); nothing recorded")]
    CommandFailed(ExitStatus),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// What happened to a successful command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A record was appended to the log.
    Recorded(CommandRecord),

    /// The command wrote nothing under the root, so nothing was recorded.
    NoOutputs,
}

/// Runs commands against one log root.
pub struct Tracker<'a> {
    storage: &'a Storage,
    script_dirs: Vec<PathBuf>,
}

impl<'a> Tracker<'a> {
    /// Script directories from `config` are taken relative to the root.
    pub fn new(storage: &'a Storage, config: &Config) -> Self {
        let script_dirs = config
            .script_dirs
            .iter()
            .map(|dir| storage.resolve(dir))
            .collect();
        Self {
            storage,
            script_dirs,
        }
    }

    /// Runs `args` through `sh -c` in the working directory and records it.
    ///
    /// A failing command records nothing. Stdin, stdout and stderr are
    /// inherited from mm.
    pub fn run(&self, args: &[String]) -> Result<Outcome, TrackError> {
        let args = expand(args);
        if args.is_empty() {
            return Err(TrackError::EmptyCommand);
        }
        let Classified { program, inputs } = classify(&args, self.storage, &self.script_dirs);
        let cmd = args.join(" ");
        debug!(%cmd, program = %program.display(), inputs = inputs.len(), "running command");

        let started_at = Timestamp::now();
        let status = Command::new("sh")
            .arg("-c")
            .arg(&cmd)
            .current_dir(self.storage.cwd())
            .status()
            .map_err(|source| TrackError::Spawn {
                cmd: cmd.clone(),
                source,
            })?;
        let ended_at = Timestamp::now();

        if !status.success() {
            return Err(TrackError::CommandFailed(status));
        }

        let window = Window {
            started_at,
            ended_at,
        };
        let outputs: Vec<PathBuf> = scan(self.storage.root(), &window)
            .into_iter()
            .map(|path| self.storage.normalize(path))
            .filter(|name| storable("output", name))
            .collect();

        if outputs.is_empty() {
            return Ok(Outcome::NoOutputs);
        }

        let inputs = inputs
            .into_iter()
            .filter(|name| !outputs.contains(name) && storable("input", name))
            .collect();

        let record = CommandRecord {
            cmd,
            script: program,
            started_at,
            ended_at,
            cwd: self.storage.normalize("."),
            inputs,
            outputs,
        };
        self.storage.append(&LogRecord::Command(record.clone()))?;
        Ok(Outcome::Recorded(record))
    }
}

/// The log joins lists with spaces, so a name containing whitespace cannot
/// be recorded.
fn storable(kind: &str, name: &Path) -> bool {
    let ok = !name.to_string_lossy().contains(char::is_whitespace);
    if !ok {
        warn!(kind, name = %name.display(), "skipping file with whitespace in its name");
    }
    ok
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::{
        collections::BTreeSet,
        fs,
        time::{Duration, SystemTime},
    };

    use tempfile::TempDir;

    fn test_storage() -> (TempDir, Storage) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::init(dir.path()).unwrap();
        (dir, storage)
    }

    fn write_old(path: &Path, contents: &str) {
        fs::write(path, contents).unwrap();
        let file = fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(3_600))
            .unwrap();
    }

    #[test]
    fn records_inputs_and_outputs() {
        let (dir, storage) = test_storage();
        write_old(&dir.path().join("in.txt"), "hello");
        let tracker = Tracker::new(&storage, &Config::default());

        let outcome = tracker.run(&["cp in.txt out.txt".to_string()]).unwrap();

        let Outcome::Recorded(record) = outcome else {
            panic!("expected a recorded command");
        };
        assert_eq!(record.cmd, "cp in.txt out.txt");
        assert_eq!(record.script, PathBuf::from("cp"));
        assert_eq!(record.cwd, PathBuf::from("."));
        assert_eq!(record.inputs, BTreeSet::from([PathBuf::from("in.txt")]));
        assert_eq!(record.outputs, [PathBuf::from("out.txt")]);

        let logged = storage.load().unwrap();
        assert_eq!(logged, [LogRecord::Command(record)]);
    }

    #[test]
    fn rewritten_input_counts_only_as_output() {
        let (dir, storage) = test_storage();
        write_old(&dir.path().join("notes.txt"), "a");
        let tracker = Tracker::new(&storage, &Config::default());

        let outcome = tracker.run(&["touch notes.txt".to_string()]).unwrap();

        let Outcome::Recorded(record) = outcome else {
            panic!("expected a recorded command");
        };
        assert!(record.inputs.is_empty());
        assert_eq!(record.outputs, [PathBuf::from("notes.txt")]);
    }

    #[test]
    fn command_without_outputs_is_not_recorded() {
        let (_dir, storage) = test_storage();
        let tracker = Tracker::new(&storage, &Config::default());

        let outcome = tracker.run(&["true".to_string()]).unwrap();

        assert_eq!(outcome, Outcome::NoOutputs);
        assert!(storage.load().unwrap().is_empty());
    }

    #[test]
    fn failing_command_is_not_recorded() {
        let (_dir, storage) = test_storage();
        let tracker = Tracker::new(&storage, &Config::default());

        let err = tracker
            .run(&["touch made.txt && false".to_string()])
            .unwrap_err();

        assert!(matches!(err, TrackError::CommandFailed(_)));
        assert!(storage.load().unwrap().is_empty());
    }

    #[test]
    fn runs_in_working_directory() {
        let (dir, _storage) = test_storage();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        let storage = Storage::discover(&sub).unwrap();
        let tracker = Tracker::new(&storage, &Config::default());

        let outcome = tracker.run(&["touch here.txt".to_string()]).unwrap();

        let Outcome::Recorded(record) = outcome else {
            panic!("expected a recorded command");
        };
        assert!(sub.join("here.txt").exists());
        assert_eq!(record.cwd, PathBuf::from("sub"));
        assert_eq!(record.outputs, [PathBuf::from("sub/here.txt")]);
    }

    #[test]
    fn configured_script_dir_sets_program() {
        let (dir, storage) = test_storage();
        fs::create_dir(dir.path().join("bin")).unwrap();
        write_old(&dir.path().join("bin/gen.sh"), "echo data > gen.out\n");
        let config = Config {
            script_dirs: vec![PathBuf::from("bin")],
        };
        let tracker = Tracker::new(&storage, &config);

        let outcome = tracker.run(&["sh bin/gen.sh".to_string()]).unwrap();

        let Outcome::Recorded(record) = outcome else {
            panic!("expected a recorded command");
        };
        assert_eq!(record.script, PathBuf::from("bin/gen.sh"));
        assert!(record.inputs.is_empty());
        assert_eq!(record.outputs, [PathBuf::from("gen.out")]);
    }
}

//! Execute-and-record: `mm run` and bare `mm <command>`.

use std::io::{self, IsTerminal};

use crate::{
    config::Config,
    storage::Storage,
    track::{Outcome, Tracker},
};

use super::format::format_record;

pub(super) fn cmd_run(storage: &Storage, command: &[String]) -> Result<(), String> {
    // With redirection the shell, not the command, writes the target file,
    // and mm would misattribute it.
    if !(io::stdin().is_terminal() && io::stdout().is_terminal()) {
        return Err("Use of redirection is not supported. Double-quote the command.".to_string());
    }

    let config = Config::load(&storage.config_path())?;
    let tracker = Tracker::new(storage, &config);

    match tracker.run(command).map_err(|e| e.to_string())? {
        Outcome::NoOutputs => eprintln!("No output file found."),
        Outcome::Recorded(record) => {
            for line in format_record(&record) {
                eprintln!("{line}");
            }
        }
    }
    Ok(())
}

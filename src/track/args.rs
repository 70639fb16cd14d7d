//! Command-line classification: which argument is the program, which are inputs.

use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use globset::GlobBuilder;
use ignore::WalkBuilder;

use crate::storage::Storage;

const GLOB_CHARS: [char; 3] = ['*', '?', '['];

/// Splits a single quoted command into words and expands `~` and globs.
///
/// `mm "python clean.py data/*.csv"` reaches mm as one argument; the shell
/// would have expanded it, so mm does the same to see the real file names.
/// Several arguments are taken as already expanded by the shell.
pub fn expand(args: &[String]) -> Vec<String> {
    match args {
        [single] => single.split_whitespace().flat_map(expand_word).collect(),
        _ => args.to_vec(),
    }
}

/// Expands one word. A pattern without matches stays literal, like `sh` does.
fn expand_word(word: &str) -> Vec<String> {
    let word = expand_home(word);
    if !word.contains(GLOB_CHARS) {
        return vec![word];
    }
    let matches = glob_matches(&word).unwrap_or_default();
    if matches.is_empty() { vec![word] } else { matches }
}

/// Walks from the literal prefix of `pattern` and keeps the paths it matches.
///
/// Hidden entries are skipped, as `sh` skips them without a leading dot.
fn glob_matches(pattern: &str) -> Option<Vec<String>> {
    let matcher = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .ok()?
        .compile_matcher();

    let pattern = Path::new(pattern);
    let base: PathBuf = pattern
        .components()
        .take_while(|c| !c.as_os_str().to_string_lossy().contains(GLOB_CHARS))
        .collect();
    let depth = pattern.components().count() - base.components().count();
    let walk_root = if base.as_os_str().is_empty() {
        Path::new(".")
    } else {
        base.as_path()
    };

    let mut found: Vec<String> = WalkBuilder::new(walk_root)
        .standard_filters(false)
        .hidden(true)
        .max_depth(Some(depth))
        .build()
        .flatten()
        .filter(|entry| entry.depth() > 0)
        .map(|entry| {
            let path = entry.into_path();
            match path.strip_prefix(".") {
                Ok(rel) if base.as_os_str().is_empty() => rel.to_path_buf(),
                _ => path,
            }
        })
        .filter(|path| matcher.is_match(path))
        .map(|path| path.to_string_lossy().into_owned())
        .collect();
    found.sort();
    Some(found)
}

fn expand_home(word: &str) -> String {
    let rest = match word.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => return word.to_string(),
    };
    match dirs::home_dir() {
        Some(home) => format!("{}{rest}", home.display()),
        None => word.to_string(),
    }
}

/// The program and input files found in a command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub program: PathBuf,
    pub inputs: BTreeSet<PathBuf>,
}

/// Classifies arguments after the command word.
///
/// With script directories configured, the first argument that exists inside
/// one of them is the program. Every other argument that exists on disk is an
/// input. `/` is never an input. Without a script argument the command word
/// itself is the program.
pub fn classify(args: &[String], storage: &Storage, script_dirs: &[PathBuf]) -> Classified {
    let mut program = None;
    let mut inputs = BTreeSet::new();

    for arg in args.iter().skip(1) {
        if arg == "/" {
            continue;
        }
        let name = storage.normalize(arg);
        let path = storage.resolve(&name);
        if !path.exists() {
            continue;
        }
        if program.is_none() && in_any(&path, script_dirs) {
            program = Some(name);
        } else {
            inputs.insert(name);
        }
    }

    let program = program.unwrap_or_else(|| match args.first() {
        Some(word) if storage.cwd().join(word).exists() => storage.normalize(word),
        Some(word) => PathBuf::from(word),
        None => PathBuf::new(),
    });

    Classified { program, inputs }
}

fn in_any(path: &Path, dirs: &[PathBuf]) -> bool {
    dirs.iter().any(|dir| path.starts_with(dir) && path != dir.as_path())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use tempfile::TempDir;

    fn words(args: &[&str]) -> Vec<String> {
        args.iter().map(ToString::to_string).collect()
    }

    fn tree() -> (TempDir, Storage) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::init(dir.path()).unwrap();
        fs::create_dir(dir.path().join("scripts")).unwrap();
        fs::write(dir.path().join("scripts/clean.py"), "").unwrap();
        fs::write(dir.path().join("raw.csv"), "").unwrap();
        fs::write(dir.path().join("lookup.tsv"), "").unwrap();
        (dir, storage)
    }

    #[test]
    fn several_arguments_are_kept() {
        let args = words(&["cat", "a b", "*.nothing"]);
        assert_eq!(expand(&args), args);
    }

    #[test]
    fn single_argument_is_split_and_globbed() {
        let (dir, _storage) = tree();
        let pattern = format!("python {}/*.csv out.csv", dir.path().display());

        let expanded = expand(&[pattern]);
        let raw = dir.path().join("raw.csv").to_string_lossy().into_owned();
        assert_eq!(expanded, ["python".to_string(), raw, "out.csv".to_string()]);
    }

    #[test]
    fn glob_only_descends_as_deep_as_the_pattern() {
        let (dir, _storage) = tree();
        let pattern = format!("{}/*/*.py", dir.path().display());

        let clean = dir.path().join("scripts/clean.py");
        assert_eq!(
            expand_word(&pattern),
            [clean.to_string_lossy().into_owned()]
        );
    }

    #[test]
    fn unmatched_glob_stays_literal() {
        let (dir, _storage) = tree();
        let pattern = format!("{}/*.parquet", dir.path().display());

        assert_eq!(expand_word(&pattern), [pattern.clone()]);
    }

    #[test]
    fn home_is_expanded() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        assert_eq!(
            expand_home("~/data.csv"),
            format!("{}/data.csv", home.display())
        );
        assert_eq!(expand_home("~user/data.csv"), "~user/data.csv");
        assert_eq!(expand_home("data~.csv"), "data~.csv");
    }

    #[test]
    fn existing_arguments_are_inputs() {
        let (_dir, storage) = tree();
        let args = words(&["python", "scripts/clean.py", "raw.csv", "out.csv", "/"]);

        let classified = classify(&args, &storage, &[]);
        assert_eq!(classified.program, PathBuf::from("python"));
        assert_eq!(
            classified.inputs,
            BTreeSet::from([PathBuf::from("raw.csv"), PathBuf::from("scripts/clean.py")])
        );
    }

    #[test]
    fn first_argument_in_script_dir_is_program() {
        let (dir, storage) = tree();
        let script_dirs = [dir.path().join("scripts")];
        let args = words(&["python", "raw.csv", "scripts/clean.py", "lookup.tsv"]);

        let classified = classify(&args, &storage, &script_dirs);
        assert_eq!(classified.program, PathBuf::from("scripts/clean.py"));
        assert_eq!(
            classified.inputs,
            BTreeSet::from([PathBuf::from("lookup.tsv"), PathBuf::from("raw.csv")])
        );
    }

    #[test]
    fn existing_command_word_is_normalized() {
        let (dir, _storage) = tree();
        let storage = Storage::discover(dir.path().join("scripts")).unwrap();
        let args = words(&["./clean.py", "../raw.csv"]);

        let classified = classify(&args, &storage, &[]);
        assert_eq!(classified.program, PathBuf::from("scripts/clean.py"));
        assert_eq!(classified.inputs, BTreeSet::from([PathBuf::from("raw.csv")]));
    }
}

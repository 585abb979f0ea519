//! The shared state directory.
//!
//! Both passes of the pipeline meet here: the ingest pass persists the line
//! map, the pick pass loads it, merges the previous selection, and appends
//! the composed command to the output script that the parent shell sources.
//! The directory defaults to `~/.cache/fpp` and can be moved with `FPP_DIR`.

use crate::line::Line;
use indexmap::IndexMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Serialized line map from the ingest pass.
pub const LINES_FILE: &str = ".lines.json";
/// Indexes of the previously selected lines.
pub const SELECTION_FILE: &str = ".selection.json";
/// The shell script the parent process sources after we exit.
pub const SCRIPT_FILE: &str = ".fpp.sh";
/// Append-only event log.
pub const LOG_FILE: &str = ".fpp.log";
/// Optional user keybindings.
pub const KEYS_FILE: &str = ".fpp.keys";

/// Mapping from input index to line; keys are dense from 0 and insertion
/// order is display order.
pub type LineMap = IndexMap<usize, Line>;

#[derive(Debug, Clone)]
pub struct StateDir {
    root: PathBuf,
}

impl StateDir {
    /// Resolve from `FPP_DIR`, falling back to `~/.cache/fpp`.
    pub fn from_env() -> Self {
        let root = match std::env::var("FPP_DIR") {
            Ok(dir) if !dir.is_empty() => expand_user(&dir),
            _ => default_dir(),
        };
        Self { root }
    }

    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn ensure(&self) -> io::Result<()> {
        fs::create_dir_all(&self.root)
    }

    pub fn lines_file(&self) -> PathBuf {
        self.root.join(LINES_FILE)
    }

    pub fn selection_file(&self) -> PathBuf {
        self.root.join(SELECTION_FILE)
    }

    pub fn script_file(&self) -> PathBuf {
        self.root.join(SCRIPT_FILE)
    }

    pub fn log_file(&self) -> PathBuf {
        self.root.join(LOG_FILE)
    }

    pub fn keys_file(&self) -> PathBuf {
        self.root.join(KEYS_FILE)
    }

    pub fn all_state_files(&self) -> Vec<PathBuf> {
        vec![
            self.lines_file(),
            self.selection_file(),
            self.log_file(),
            self.script_file(),
        ]
    }

    /// Remove every state file. Used by `--clean`.
    pub fn clean(&self) -> io::Result<usize> {
        let mut removed = 0;
        for path in self.all_state_files() {
            if path.is_file() {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    pub fn save_lines(&self, lines: &LineMap) -> io::Result<()> {
        self.write_json(&self.lines_file(), lines)
    }

    pub fn load_lines(&self) -> io::Result<LineMap> {
        let contents = fs::read_to_string(self.lines_file())?;
        serde_json::from_str(&contents).map_err(io::Error::other)
    }

    pub fn save_selection(&self, indexes: &[usize]) -> io::Result<()> {
        self.write_json(&self.selection_file(), &indexes)
    }

    /// The previous selection, if one was persisted. `Ok(None)` when the
    /// file does not exist; corrupt contents are an error the caller
    /// surfaces through the output script.
    pub fn load_selection(&self) -> io::Result<Option<Vec<usize>>> {
        let path = self.selection_file();
        if !path.is_file() {
            return Ok(None);
        }
        let contents = fs::read_to_string(path)?;
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(io::Error::other)
    }

    pub fn clear_selection(&self) -> io::Result<()> {
        let path = self.selection_file();
        if path.is_file() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Append one timestamped event to the log. Logging never fails loudly;
    /// a state dir that cannot be written will surface through the script
    /// writes instead.
    pub fn log_event(&self, event: &str) {
        let _ = self.try_log(event);
    }

    fn try_log(&self, event: &str) -> io::Result<()> {
        self.ensure()?;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.log_file())?;
        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        writeln!(file, "{now} {event}")
    }

    pub fn clear_log(&self) -> io::Result<()> {
        self.ensure()?;
        fs::write(self.log_file(), "")
    }

    fn write_json<T: serde::Serialize>(&self, path: &Path, value: &T) -> io::Result<()> {
        self.ensure()?;
        let json = serde_json::to_string(value).map_err(io::Error::other)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.root)?;
        tmp.write_all(json.as_bytes())?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}

fn default_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".cache")
        .join("fpp")
}

fn expand_user(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(rest),
        None => PathBuf::from(path),
    }
}

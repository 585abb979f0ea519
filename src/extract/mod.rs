//! Path extraction from noisy terminal output.
//!
//! One input line yields at most one [`MatchResult`]: the raw path-like
//! token, an optional line number, and the character span of the match. The
//! waterfall in [`patterns`] decides which token wins; [`prepend_dir`] turns
//! the raw token into a usable filesystem path.

mod patterns;

use patterns::{REGEX_WATERFALL, RegexConfig};
use regex::Captures;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Global symbols that resolve to directories under the home dir. A match
/// like `www/myFile.py` becomes `~/www/myFile.py`. Extended at runtime with
/// the comma-separated `FPP_REPOS` environment variable.
const REPOS: &[&str] = &["www"];

/// A successful extraction: the raw captured path, the line number (0 means
/// none) and the character span of the whole match within the plain line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub path: String,
    pub num: usize,
    pub start: usize,
    pub end: usize,
}

/// Everything the extractor needs from the environment, resolved once per
/// invocation: the repository root, the repo short-name list, the
/// home-prepending flag, and the directories against which relative paths
/// are checked for existence.
#[derive(Debug, Clone)]
pub struct Runtime {
    repo_prefix: String,
    repos: Vec<String>,
    disable_home_prepend: bool,
    home: PathBuf,
    base_dir: PathBuf,
}

impl Runtime {
    /// Resolve the runtime from the process environment, probing git and
    /// mercurial for the repository root.
    pub fn from_env() -> Self {
        let mut runtime = Self::new(&detect_repo_root());
        runtime.disable_home_prepend = std::env::var_os("FPP_DISABLE_PREPENDING_HOME_WITH_SLASH")
            .is_some_and(|v| !v.is_empty());
        if let Ok(extra) = std::env::var("FPP_REPOS") {
            runtime
                .repos
                .extend(extra.split(',').filter(|s| !s.is_empty()).map(String::from));
        }
        runtime
    }

    /// A runtime rooted at the given repository path, with default repo
    /// names and flags.
    pub fn new(repo_root: &str) -> Self {
        Self {
            repo_prefix: format!("{}/", repo_root.trim()),
            repos: REPOS.iter().map(|s| s.to_string()).collect(),
            disable_home_prepend: false,
            home: dirs::home_dir().unwrap_or_else(|| PathBuf::from("/")),
            base_dir: PathBuf::from("."),
        }
    }

    /// Resolve relative paths against this directory when checking file
    /// existence. Defaults to the current directory.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    pub fn with_home(mut self, dir: impl Into<PathBuf>) -> Self {
        self.home = dir.into();
        self
    }

    /// The repository root with a trailing slash, as prepended to repo-
    /// relative matches.
    pub fn repo_prefix(&self) -> &str {
        &self.repo_prefix
    }

    pub fn expand_user(&self, path: &str) -> String {
        match path.strip_prefix("~/") {
            Some(rest) => self.home.join(rest).to_string_lossy().into_owned(),
            None => path.to_string(),
        }
    }

    pub fn path_is_file(&self, path: &str) -> bool {
        let p = Path::new(path);
        if p.is_absolute() {
            p.is_file()
        } else {
            self.base_dir.join(p).is_file()
        }
    }
}

/// Ask git, then mercurial, for the repository the current directory lives
/// in; outside any repo the current directory itself is the root.
fn detect_repo_root() -> String {
    for (program, args) in [
        ("git", &["rev-parse", "--show-toplevel"][..]),
        ("hg", &["root"][..]),
    ] {
        if let Ok(out) = Command::new(program).args(args).output() {
            if out.status.success() {
                let root = String::from_utf8_lossy(&out.stdout).trim().to_string();
                if !root.is_empty() {
                    return root;
                }
            }
        }
    }
    "./".to_string()
}

/// Extract a path-like token from one plain-text line.
///
/// Without validation the first waterfall match wins outright. With
/// validation every eligible pattern contributes a candidate, and the first
/// whose resolved path is an existing regular file (or a `.../`
/// git-abbreviated path, kept so the UI can warn) is returned.
pub fn match_line(
    line: &str,
    validate_file_exists: bool,
    all_input: bool,
    runtime: &Runtime,
) -> Option<MatchResult> {
    if !validate_file_exists {
        return match_line_impl(line, false, all_input).into_iter().next();
    }
    let results = match_line_impl(line, true, all_input);
    results.into_iter().find(|result| {
        runtime.path_is_file(&prepend_dir(&result.path, true, runtime))
            || result.path.starts_with(".../")
    })
}

fn match_line_impl(
    line: &str,
    with_file_inspection: bool,
    with_all_lines_matched: bool,
) -> Vec<MatchResult> {
    // every candidate is collected, since filesystem validation may filter
    // out the earlier ones (particularly those with hyphenated extensions)
    let mut results = Vec::new();
    for config in REGEX_WATERFALL.iter() {
        if config.with_all_lines_matched != with_all_lines_matched {
            continue;
        }
        if config.only_with_file_inspection && !with_file_inspection {
            continue;
        }
        let Some(caps) = config.regex.captures(line) else {
            continue;
        };

        if let Some(preferred) = &config.preferred {
            // did a better match start earlier in the line?
            if let Some(other) = preferred.captures(line) {
                let other_start = other.get(0).map(|m| m.start()).unwrap_or(usize::MAX);
                let our_start = caps.get(0).map(|m| m.start()).unwrap_or(usize::MAX);
                if other_start < our_start {
                    results.push(unpack(&other, config, line));
                    continue;
                }
            }
        }
        results.push(unpack(&caps, config, line));
    }
    results
}

fn unpack(caps: &Captures, config: &RegexConfig, line: &str) -> MatchResult {
    let whole = caps.get(0).expect("match has no span");
    let num = if config.no_num {
        0
    } else {
        caps.get(config.num_group)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };
    MatchResult {
        path: caps[1].to_string(),
        num,
        start: char_offset(line, whole.start()),
        end: char_offset(line, whole.end()),
    }
}

fn char_offset(line: &str, byte_offset: usize) -> usize {
    line[..byte_offset].chars().count()
}

/// Resolve a raw captured path into the path shown to the user and handed to
/// the dispatched command.
pub fn prepend_dir(file: &str, with_file_inspection: bool, runtime: &Runtime) -> String {
    if file.chars().count() < 2 {
        return file.to_string();
    }

    if file.starts_with('/') {
        return file.to_string();
    }

    if file.starts_with(".../") {
        // git's abbreviated paths; nothing can be done with these, the UI
        // warns about them downstream
        return file.to_string();
    }

    if file.starts_with("~/") {
        return runtime.expand_user(file);
    }

    // relative dirs (grep output) resolve as-is
    if file.starts_with("./") || file.starts_with("../") {
        return file.to_string();
    }

    // some setups expand the path beforehand, so /home/... may arrive
    // without its leading slash
    let first = file.split('/').next().unwrap_or("");
    if first == "home" && !runtime.disable_home_prepend {
        return format!("/{file}");
    }

    if runtime.repos.iter().any(|repo| repo == first) {
        return runtime.expand_user(&format!("~/{file}"));
    }

    if !file.contains('/') {
        // assume current dir
        return format!("./{file}");
    }

    // git show and diff prefix paths with a/ and b/; git status never does,
    // so there is no relative-dir ambiguity here
    if let Some(rest) = file.strip_prefix("a/").or_else(|| file.strip_prefix("b/")) {
        return format!("{}{}", runtime.repo_prefix, rest);
    }

    let mut parts = file.split('/');
    if parts.next() == Some("www") {
        let rest: Vec<&str> = parts.collect();
        return format!("{}{}", runtime.repo_prefix, rest.join("/"));
    }

    let top_level = format!("{}{}", runtime.repo_prefix, file);
    if !with_file_inspection {
        return top_level;
    }
    // git status emits paths relative to the working dir while every other
    // git command is relative to the top level, so prefer the relative form
    // when only it exists
    let relative = format!("./{file}");
    if !runtime.path_is_file(&top_level) && runtime.path_is_file(&relative) {
        relative
    } else {
        top_level
    }
}

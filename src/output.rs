//! Composition of the output shell script.
//!
//! The picker itself never runs the user's command: it appends the composed
//! command to `.fpp.sh` and exits, and the wrapping shell function sources
//! that script. Everything here is therefore string assembly plus appends to
//! one file.

use crate::line::MatchedLine;
use crate::state::StateDir;
use std::fs;
use std::io::{self, Write};

const RED_COLOR: &str = "\\033[0;31m";
const NO_COLOR: &str = "\\033[0m";

pub const INVALID_FILE_WARNING: &str = "
Warning! Some invalid or unresolvable files were detected.
";

pub const GIT_ABBREVIATION_WARNING: &str = "
It looks like one of these is a git abbreviated file with
a triple dot path (.../). Try to turn off git's abbreviation
with --numstat so we get actual paths (not abbreviated
versions which cannot be resolved.
";

pub const CONTINUE_WARNING: &str = "Are you sure you want to continue? Ctrl-C to quit";

pub const LOAD_SELECTION_WARNING: &str = "
WARNING! Loading the standard input and previous selection
failed. This is probably due to a backwards compatibility issue
with upgrading PathPicker or an internal error. Please pipe
a new set of input to PathPicker to start fresh (after which
this error will go away)
";

/// Editors whose line argument is `+N 'path'`.
const PLUS_LINE_EDITORS: &[&str] = &["vi", "nvim", "nano", "joe", "emacs", "emacsclient", "micro"];
/// Editors whose line argument is `'path:N'`.
const COLON_LINE_EDITORS: &[&str] = &["subl", "sublime", "atom"];

/// Editor selection, resolved once from the environment.
#[derive(Debug, Clone)]
pub struct EditorConfig {
    pub editor: String,
    pub editor_path: String,
    pub disable_split: bool,
    pub linenum_sep: Option<String>,
}

impl EditorConfig {
    /// `FPP_EDITOR`, then `VISUAL`, then `EDITOR`, with vim as the last
    /// resort.
    pub fn from_env() -> Self {
        let editor_path = std::env::var("FPP_EDITOR")
            .or_else(|_| std::env::var("VISUAL"))
            .or_else(|_| std::env::var("EDITOR"))
            .ok()
            .filter(|v| !v.is_empty());
        let (editor, editor_path) = match editor_path {
            Some(path) => {
                let editor = std::path::Path::new(&path)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.clone());
                (editor, path)
            }
            None => ("vim".to_string(), "vim".to_string()),
        };
        Self {
            editor,
            editor_path,
            disable_split: std::env::var_os("FPP_DISABLE_SPLIT").is_some(),
            linenum_sep: std::env::var("FPP_LINENUM_SEP").ok().filter(|v| !v.is_empty()),
        }
    }

    pub fn new(editor: &str) -> Self {
        Self {
            editor: editor.to_string(),
            editor_path: editor.to_string(),
            disable_split: false,
            linenum_sep: None,
        }
    }
}

/// Append-oriented handle on the output script.
#[derive(Debug, Clone)]
pub struct OutputScript {
    state: StateDir,
    shell: String,
    editor: EditorConfig,
}

impl OutputScript {
    pub fn from_env(state: StateDir) -> Self {
        Self {
            shell: std::env::var("SHELL").unwrap_or_default(),
            editor: EditorConfig::from_env(),
            state,
        }
    }

    pub fn new(state: StateDir, shell: &str, editor: EditorConfig) -> Self {
        Self {
            state,
            shell: shell.to_string(),
            editor,
        }
    }

    /// Dispatch a command over the chosen lines. An empty command falls back
    /// to opening the lines in the configured editor.
    pub fn exec_composed_command(&self, command: &str, lines: &[&MatchedLine]) -> io::Result<()> {
        if command.trim().is_empty() {
            return self.edit_files(lines);
        }
        let command = compose_command(command, lines);
        self.append_alias_expansion()?;
        self.append_if_invalid(lines)?;
        self.append_friendly_command(&command)?;
        self.append_exit()
    }

    /// Open the chosen lines in the editor.
    pub fn edit_files(&self, lines: &[&MatchedLine]) -> io::Result<()> {
        let files_and_lines: Vec<(String, usize)> = lines
            .iter()
            .map(|line| (line.path.clone(), line.num))
            .collect();
        let command = join_files_into_command(&files_and_lines, &self.editor);
        self.append_if_invalid(lines)?;
        self.append(&command)?;
        self.append_exit()
    }

    fn append_if_invalid(&self, lines: &[&MatchedLine]) -> io::Result<()> {
        let invalid: Vec<_> = lines.iter().filter(|line| !line.is_resolvable()).collect();
        if invalid.is_empty() {
            return Ok(());
        }
        self.append_error(INVALID_FILE_WARNING)?;
        if invalid.iter().any(|line| line.is_git_abbreviated_path()) {
            self.append_error(GIT_ABBREVIATION_WARNING)?;
        }
        self.append(&format!("read -p \"{CONTINUE_WARNING}\" -r"))
    }

    pub fn output_nothing(&self) -> io::Result<()> {
        self.append("echo \"nothing to do!\"; exit 1")
    }

    pub fn output_no_lines_matched(&self) -> io::Result<()> {
        self.write("echo \"No lines matched!!\";")?;
        self.append_exit()
    }

    pub fn clear(&self) -> io::Result<()> {
        self.write("")
    }

    /// bash runs with alias expansion off even under `-i`; zsh expands
    /// aliases in interactive mode already, and fish has no shopt at all.
    fn append_alias_expansion(&self) -> io::Result<()> {
        if !self.shell.contains("fish") {
            self.append(
                "\nif type shopt > /dev/null; then\n  shopt -s expand_aliases\nfi\n",
            )?;
        }
        Ok(())
    }

    fn append_friendly_command(&self, command: &str) -> io::Result<()> {
        let header = format!(
            "echo \"executing command:\"\necho \"{}\"",
            command.replace('"', "\\\"")
        );
        self.append(&header)?;
        self.append(command)
    }

    pub fn append_error(&self, text: &str) -> io::Result<()> {
        self.append(&format!("printf \"{RED_COLOR}{text}{NO_COLOR}\\n\""))
    }

    /// `csh`, `fish` and `rc` spell the last exit status `$status`; the
    /// Bourne family uses `$?`. `$SHELL` is the login shell, not necessarily
    /// the current one, but there is no more reliable signal available.
    pub fn append_exit(&self) -> io::Result<()> {
        let status = if self.shell.ends_with("csh")
            || self.shell.ends_with("fish")
            || self.shell.ends_with("rc")
        {
            "$status"
        } else {
            "$?"
        };
        self.append(&format!("exit {status};"))
    }

    pub fn append(&self, text: &str) -> io::Result<()> {
        fs::create_dir_all(self.state.root())?;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.state.script_file())?;
        writeln!(file, "{text}")
    }

    pub fn write(&self, text: &str) -> io::Result<()> {
        fs::create_dir_all(self.state.root())?;
        fs::write(self.state.script_file(), format!("{text}\n"))
    }

    pub fn contents(&self) -> io::Result<String> {
        fs::read_to_string(self.state.script_file())
    }
}

/// Compose the user's command over the chosen paths: `cd` copies the first
/// path's directory aside, `$F` is substituted, and anything else gets the
/// quoted paths appended.
pub fn compose_command(command: &str, lines: &[&MatchedLine]) -> String {
    if is_cd_command(command) {
        compose_cd_command(lines)
    } else {
        compose_file_command(command, lines)
    }
}

fn is_cd_command(command: &str) -> bool {
    command.starts_with("cd ") || command == "cd"
}

fn compose_cd_command(lines: &[&MatchedLine]) -> String {
    let dir = lines
        .first()
        .map(|line| line.dir())
        .unwrap_or_default();
    let expanded = match dir.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .unwrap_or_else(|| std::path::PathBuf::from("~"))
            .join(rest),
        None => std::path::PathBuf::from(&dir),
    };
    let absolute = std::path::absolute(&expanded).unwrap_or(expanded);
    format!("echo \"{}\" > ~/.dircopy", absolute.to_string_lossy())
}

fn compose_file_command(command: &str, lines: &[&MatchedLine]) -> String {
    let paths: Vec<String> = lines
        .iter()
        .map(|line| format!("'{}'", line.path))
        .collect();
    let path_str = paths.join(" ");
    if command.contains("$F") {
        command.replace("$F", &path_str)
    } else {
        format!("{command} {path_str}")
    }
}

/// Build the editor invocation for the chosen files. vim-family editors get
/// split windows or tabs unless splitting is disabled; other known editors
/// get their own line-number argument style; `N = 0` means no line argument.
pub fn join_files_into_command(
    files_and_lines: &[(String, usize)],
    editor: &EditorConfig,
) -> String {
    let mut cmd = format!("{} ", editor.editor_path);

    if editor.editor == "vim -p" {
        if let Some((first_path, first_num)) = files_and_lines.first() {
            cmd.push_str(&format!(" +{first_num} {first_path}"));
            for (path, num) in &files_and_lines[1..] {
                cmd.push_str(&format!(" +\"tabnew +{num} {path}\""));
            }
        }
    } else if ["vim", "mvim", "nvim"].contains(&editor.editor.as_str()) && !editor.disable_split {
        if let Some((first_path, first_num)) = files_and_lines.first() {
            cmd.push_str(&format!(" +{first_num} {first_path}"));
            for (path, num) in &files_and_lines[1..] {
                cmd.push_str(&format!(" +\"vsp +{num} {path}\""));
            }
        }
    } else {
        let editor_without_args = editor.editor.split_whitespace().next().unwrap_or_default();
        for (path, num) in files_and_lines {
            if PLUS_LINE_EDITORS.contains(&editor_without_args) && *num != 0 {
                cmd.push_str(&format!(" +{num} '{path}'"));
            } else if COLON_LINE_EDITORS.contains(&editor_without_args) && *num != 0 {
                cmd.push_str(&format!(" '{path}:{num}'"));
            } else if *num != 0 && editor.linenum_sep.is_some() {
                let sep = editor.linenum_sep.as_deref().unwrap_or_default();
                cmd.push_str(&format!(" '{path}{sep}{num}'"));
            } else {
                cmd.push_str(&format!(" '{path}'"));
            }
        }
    }
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ansi::FormattedText;
    use crate::extract::{Runtime, match_line};

    fn matched(input: &str) -> MatchedLine {
        let runtime = Runtime::new("/repo");
        let text = FormattedText::parse(input);
        let result = match_line(&text.plain(), false, false, &runtime).unwrap();
        MatchedLine::new(text, result, 0, false, false, &runtime)
    }

    fn script(dir: &tempfile::TempDir, shell: &str, editor: &str) -> OutputScript {
        OutputScript::new(
            StateDir::at(dir.path()),
            shell,
            EditorConfig::new(editor),
        )
    }

    #[test]
    fn vim_gets_vertical_splits() {
        let files = vec![
            ("/repo/foo.js".to_string(), 12),
            ("/repo/bar.js".to_string(), 0),
        ];
        let cmd = join_files_into_command(&files, &EditorConfig::new("vim"));
        assert_eq!(cmd, "vim  +12 /repo/foo.js +\"vsp +0 /repo/bar.js\"");
    }

    #[test]
    fn vim_split_respects_disable_flag() {
        let files = vec![
            ("/repo/foo.js".to_string(), 12),
            ("/repo/bar.js".to_string(), 3),
        ];
        let mut editor = EditorConfig::new("vim");
        editor.disable_split = true;
        let cmd = join_files_into_command(&files, &editor);
        assert_eq!(cmd, "vim  +12 '/repo/foo.js' +3 '/repo/bar.js'");
    }

    #[test]
    fn vim_tab_mode_gets_tabnew() {
        let files = vec![
            ("/repo/foo.js".to_string(), 1),
            ("/repo/bar.js".to_string(), 2),
        ];
        let cmd = join_files_into_command(&files, &EditorConfig::new("vim -p"));
        assert_eq!(cmd, "vim -p  +1 /repo/foo.js +\"tabnew +2 /repo/bar.js\"");
    }

    #[test]
    fn sublime_uses_colon_line_numbers() {
        let files = vec![("/repo/foo.js".to_string(), 12)];
        let cmd = join_files_into_command(&files, &EditorConfig::new("subl"));
        assert_eq!(cmd, "subl  '/repo/foo.js:12'");
    }

    #[test]
    fn unknown_editor_uses_sep_env_or_plain_path() {
        let files = vec![("/repo/foo.js".to_string(), 12)];
        let mut editor = EditorConfig::new("someeditor");
        assert_eq!(
            join_files_into_command(&files, &editor),
            "someeditor  '/repo/foo.js'"
        );
        editor.linenum_sep = Some("@".to_string());
        assert_eq!(
            join_files_into_command(&files, &editor),
            "someeditor  '/repo/foo.js@12'"
        );
    }

    #[test]
    fn zero_line_number_means_no_line_argument() {
        let files = vec![("/repo/foo.js".to_string(), 0)];
        let cmd = join_files_into_command(&files, &EditorConfig::new("nano"));
        assert_eq!(cmd, "nano  '/repo/foo.js'");
    }

    #[test]
    fn command_appends_quoted_paths() {
        let a = matched("html/js/one.js");
        let b = matched("html/js/two.js");
        let cmd = compose_command("git add", &[&a, &b]);
        assert_eq!(cmd, "git add '/repo/html/js/one.js' '/repo/html/js/two.js'");
    }

    #[test]
    fn command_substitutes_dollar_f() {
        let a = matched("html/js/one.js");
        let cmd = compose_command("mv $F ../over/here", &[&a]);
        assert_eq!(cmd, "mv '/repo/html/js/one.js' ../over/here");
    }

    #[test]
    fn cd_command_copies_directory_aside() {
        let a = matched("html/js/one.js");
        let cmd = compose_command("cd", &[&a]);
        assert_eq!(cmd, "echo \"/repo/html/js\" > ~/.dircopy");
        let cmd = compose_command("cd somewhere", &[&a]);
        assert_eq!(cmd, "echo \"/repo/html/js\" > ~/.dircopy");
    }

    #[test]
    fn exit_status_variable_follows_shell() {
        let dir = tempfile::tempdir().unwrap();
        for (shell, status) in [
            ("/bin/bash", "$?"),
            ("/bin/zsh", "$?"),
            ("/usr/bin/fish", "$status"),
            ("/bin/tcsh", "$status"),
            ("/usr/bin/rc", "$status"),
        ] {
            let out = script(&dir, shell, "vim");
            out.clear().unwrap();
            out.append_exit().unwrap();
            assert_eq!(out.contents().unwrap(), format!("\nexit {status};\n"));
        }
    }

    #[test]
    fn dispatch_writes_warning_block_for_unresolvable_paths() {
        let dir = tempfile::tempdir().unwrap();
        let out = script(&dir, "/bin/bash", "vim");
        out.clear().unwrap();

        let runtime = Runtime::new("/repo");
        let text = FormattedText::parse(".../something/foo.py");
        let result = match_line(&text.plain(), false, false, &runtime).unwrap();
        let line = MatchedLine::new(text, result, 0, false, false, &runtime);

        out.exec_composed_command("git add", &[&line]).unwrap();
        let contents = out.contents().unwrap();
        let warning_at = contents
            .find("invalid or unresolvable")
            .expect("warning missing");
        assert!(contents.contains("triple dot path"));
        assert!(contents.contains(&format!("read -p \"{CONTINUE_WARNING}\" -r")));
        let command_at = contents.find("git add '").expect("command missing");
        assert!(warning_at < command_at, "warning must precede the command");
    }

    #[test]
    fn quit_script_reports_nothing_to_do() {
        let dir = tempfile::tempdir().unwrap();
        let out = script(&dir, "/bin/bash", "vim");
        out.clear().unwrap();
        out.output_nothing().unwrap();
        assert!(
            out.contents()
                .unwrap()
                .contains("echo \"nothing to do!\"; exit 1")
        );
    }

    #[test]
    fn editor_dispatch_appends_exit() {
        let dir = tempfile::tempdir().unwrap();
        let out = script(&dir, "/bin/bash", "nano");
        out.clear().unwrap();
        let a = matched("html/js/one.js:44");
        out.edit_files(&[&a]).unwrap();
        let contents = out.contents().unwrap();
        assert!(contents.contains("nano  +44 '/repo/html/js/one.js'"));
        assert!(contents.trim_end().ends_with("exit $?;"));
    }

    #[test]
    fn alias_expansion_is_skipped_for_fish() {
        let dir = tempfile::tempdir().unwrap();
        let a = matched("html/js/one.js");

        let out = script(&dir, "/usr/bin/fish", "vim");
        out.clear().unwrap();
        out.exec_composed_command("git add", &[&a]).unwrap();
        assert!(!out.contents().unwrap().contains("shopt"));

        let out = script(&dir, "/bin/bash", "vim");
        out.clear().unwrap();
        out.exec_composed_command("git add", &[&a]).unwrap();
        assert!(out.contents().unwrap().contains("shopt -s expand_aliases"));
    }
}

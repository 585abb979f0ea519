use clap::Parser;

/// The flag set the wrapping shell function passes through to both passes.
#[derive(Parser, Debug, Default)]
#[command(name = "fpp")]
#[command(version)]
#[command(about = "Select path-like tokens out of piped terminal output")]
#[command(
    long_about = "fpp - PathPicker. Pipe terminal output in, pick the paths you care about,\n\
    and open them in your editor or hand them to any shell command.\n\n\
    Examples:\n  \
    git status | fpp              # pick from changed files\n  \
    grep -rn TODO . | fpp         # jump straight to the matching lines\n  \
    git branch | fpp -ai -c 'git checkout'  # pick over arbitrary lines"
)]
pub struct Cli {
    /// Record input and output. This is largely used for testing, but you
    /// may find it useful for scripting.
    #[arg(short = 'r', long = "record")]
    pub record: bool,

    /// Command to execute once files have been selected. Normally fpp opens
    /// your editor (see $FPP_EDITOR, $VISUAL, $EDITOR) when you press enter;
    /// with this option the given command runs instead.
    #[arg(short = 'c', long = "command", num_args = 1.., value_name = "COMMAND")]
    pub command: Vec<String>,

    /// Automatically execute the given keys when the file list shows up.
    /// Useful for e.g. jumping to the end of a long list with "END".
    #[arg(short = 'e', long = "execute-keys", num_args = 1.., value_name = "KEY")]
    pub execute_keys: Vec<String>,

    /// Automatically select all matched lines once the interactive editor
    /// has been entered.
    #[arg(short = 'a', long = "all")]
    pub all: bool,

    /// Recognize every non-blank input line as a match. This allows
    /// selection over sources that are not paths at all, like git branches
    /// or mercurial bookmarks.
    #[arg(long = "all-input")]
    pub all_input: bool,

    /// Disable the filesystem check on regex matches. Particularly useful
    /// for selecting deleted files out of git status that no longer exist
    /// on disk.
    #[arg(long = "no-file-checks")]
    pub no_file_checks: bool,

    /// Normally the command runs in an interactive subshell; with this flag
    /// it runs in a non-interactive one like a normal shell script.
    /// (Consumed by the shell wrapper, not by the core.)
    #[arg(long = "non-interactive")]
    pub non_interactive: bool,

    /// Remove the state files fpp uses when starting up, including the
    /// previous input and selection. Useful in script contexts where the
    /// previous state should be discarded.
    #[arg(long = "clean")]
    pub clean: bool,

    /// Keep PathPicker open once a file selection or command is performed,
    /// looping until Ctrl-C terminates the process.
    #[arg(long = "keep-open")]
    pub keep_open: bool,
}

impl Cli {
    pub fn preset_command(&self) -> String {
        self.command.join(" ")
    }

    pub fn disable_file_checks(&self) -> bool {
        self.no_file_checks || self.all_input
    }
}

/// The historical flag spellings predate clap's one-letter shorts, so the
/// multi-character ones are rewritten to their long forms before parsing.
pub fn normalize_args(args: impl Iterator<Item = String>) -> Vec<String> {
    args.map(|arg| {
        match arg.as_str() {
            "-ai" => "--all-input",
            "-nfc" => "--no-file-checks",
            "-ni" => "--non-interactive",
            "-ko" => "--keep-open",
            _ => return arg,
        }
        .to_string()
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let args = std::iter::once("fpp".to_string()).chain(args.iter().map(|s| s.to_string()));
        Cli::parse_from(normalize_args(args))
    }

    #[test]
    fn preset_command_joins_words() {
        let cli = parse(&["-c", "git", "add"]);
        assert_eq!(cli.preset_command(), "git add");
    }

    #[test]
    fn legacy_short_flags_are_normalized() {
        let cli = parse(&["-ai", "-nfc", "-ko"]);
        assert!(cli.all_input);
        assert!(cli.no_file_checks);
        assert!(cli.keep_open);
    }

    #[test]
    fn all_input_implies_no_file_checks() {
        let cli = parse(&["-ai"]);
        assert!(cli.disable_file_checks());
        let cli = parse(&[]);
        assert!(!cli.disable_file_checks());
    }

    #[test]
    fn execute_keys_collect_in_order() {
        let cli = parse(&["-e", "f", "j", "END"]);
        assert_eq!(cli.execute_keys, vec!["f", "j", "END"]);
    }
}

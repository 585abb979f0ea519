//! Usage copy for the chrome: the wide-terminal sidebar pages, the
//! narrow-mode cheat sheet, and the command prompt strings.

pub const USAGE_PAGE: &str = "
    * [f] toggle the selection of a file
    * [F] toggle and move downward by 1
    * [A] toggle selection of all (unique) files
    * [down arrow|j] move downward by 1
    * [up arrow|k] move upward by 1
    * [<space>] page down
    * [b] page up
    * [x] quick select mode
    * [d] describe file


Once you have your files selected, you can
either open them in your favorite
text editor or execute commands with
them via command mode:

    * [<Enter>] open all selected files
        (or file under cursor if none selected)
        in $EDITOR
    * [c] enter command mode
";

pub const USAGE_COMMAND: &str = "
Command mode is helpful when you want to
execute bash commands with the filenames
you have selected. By default the filenames
are appended automatically to command you
enter before it is executed, so all you have
to do is type the prefix. Some examples:

    * git add
    * git checkout HEAD~1 --
    * rm -rf

These commands get formatted into:
    * git add file1 file2 # etc
    * git checkout HEAD~1 -- file1 file2
    * rm -rf file1 file2 # etc

If your command needs filenames in the middle,
the token \"$F\" will be replaced with your
selected filenames if it is found in the command
string. Examples include:

    * scp $F dev:~/backup
    * mv $F ../over/here

Which format to:
    * scp file1 file2 dev:~/backup
    * mv file1 file2 ../over/here
";

/// Printed to the terminal when fpp is run without piped input and without
/// previous state to reuse.
pub const USAGE_INTRO: &str = "
Welcome to fpp, the PathPicker! We hope your stay
with us is enjoyable.

To get started with fpp, pipe some kind of terminal output into the program.
Examples include:

    * git status | fpp
    * git show | fpp
    * git diff HEAD master | fpp
    * git diff HEAD~10 --numstat | fpp
    * grep -r \"Banana\" . | fpp
    * find . -iname \"*.js\" | fpp

Once fpp parses your input (and something that looks like a file matches), it
will put you inside a pager that will allow you to select files with the
following commands:
";

// options displayed to the user at the bottom of the screen
pub const SHORT_NAV_OPTION_SELECTION: &str = "[f|A] selection";
pub const SHORT_NAV_OPTION_NAVIGATION: &str = "[down|j|up|k|space|b] navigation";
pub const SHORT_NAV_OPTION_OPEN: &str = "[enter] open";
pub const SHORT_NAV_OPTION_QUICK_SELECT: &str = "[x] quick select mode";
pub const SHORT_NAV_OPTION_COMMAND: &str = "[c] command mode";

pub const SHORT_COMMAND_USAGE: &str =
    "command examples: | git add | git checkout HEAD~1 -- | mv $F ../here/ |";
pub const SHORT_COMMAND_PROMPT: &str = "Type a command below! Paths will be appended or replace $F";
pub const SHORT_COMMAND_PROMPT2: &str = "Enter a blank line to go back to the selection process";
pub const SHORT_PATHS_HEADER: &str = "Paths you have selected:";

/// The short cheat sheet for the two-row bottom bar; the "open" entry makes
/// no sense in all-input mode and is dropped there.
pub fn short_nav_usage(all_input: bool) -> String {
    let mut options = vec![
        SHORT_NAV_OPTION_SELECTION,
        SHORT_NAV_OPTION_NAVIGATION,
        SHORT_NAV_OPTION_OPEN,
        SHORT_NAV_OPTION_QUICK_SELECT,
        SHORT_NAV_OPTION_COMMAND,
    ];
    if all_input {
        options.retain(|&opt| opt != SHORT_NAV_OPTION_OPEN);
    }
    options.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_input_drops_the_open_hint() {
        assert!(short_nav_usage(false).contains("[enter] open"));
        assert!(!short_nav_usage(true).contains("[enter] open"));
        assert!(short_nav_usage(true).contains("[c] command mode"));
    }
}

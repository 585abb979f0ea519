//! The prioritized regex waterfall.
//!
//! Order matters: the first suitable config wins (subject to the
//! preferred-alternate tiebreak), so the patterns run from the most anchored
//! (home-dir paths, grep-style results with line numbers) down to the
//! loosest (bare filenames, no-period files), with the whole-line catch-all
//! participating only in all-input mode.

use regex::Regex;
use std::sync::LazyLock;

pub struct RegexConfig {
    pub name: &'static str,
    pub regex: Regex,
    /// When set and this pattern matched, the alternate is also tried; if
    /// the alternate starts earlier in the line it wins.
    pub preferred: Option<Regex>,
    /// 1-based capture group holding the line number.
    pub num_group: usize,
    pub no_num: bool,
    pub only_with_file_inspection: bool,
    pub with_all_lines_matched: bool,
}

fn config(name: &'static str, pattern: &str) -> RegexConfig {
    RegexConfig {
        name,
        regex: Regex::new(pattern).expect(name),
        preferred: None,
        num_group: 3,
        no_num: false,
        only_with_file_inspection: false,
        with_all_lines_matched: false,
    }
}

const MASTER: &str = r"(/?([a-z.A-Z0-9\-_]+/)+[@a-zA-Z0-9\-_+.]+\.[a-zA-Z0-9]{1,10})[:-]?(\d+)?";

// Like the master pattern but with extensions up to 30 chars including
// hyphens and tildes. Only run with filesystem validation since it
// overmatches wildly otherwise.
const MASTER_MORE_EXTENSIONS: &str =
    r"(/?([a-z.A-Z0-9\-_]+/)+[@a-zA-Z0-9\-_+.]+\.[a-zA-Z0-9~-]{1,30})[:-]?(\d+)?";

const HOMEDIR: &str = r"(~/([a-z.A-Z0-9\-_]+/)+[@a-zA-Z0-9\-_+.]+\.[a-zA-Z0-9]{1,10})[:-]?(\d+)?";

// Grep-service results with weird filenames (all caps, no extension). The
// line number is required, otherwise this would be far too lax.
const OTHER_BGS_RESULT: &str = r"(/?([a-z.A-Z0-9\-_]+/)+[a-zA-Z0-9_.]{3,})[:-]?(\d+)";

const ENTIRE_TRIMMED_LINE_IF_NOT_WHITESPACE: &str = r"(\S.*\S|\S)";

// The original terminator here was (\s|$|:)+ which repeats a zero-width
// alternative; [\s:]*(?:[\s:]|$) recognizes the same language without the
// quantified anchor.
const TERMINATOR: &str = r"[\s:]*(?:[\s:]|$)";

static JUST_FILE_WITH_NUMBER: LazyLock<String> =
    LazyLock::new(|| format!(r"([@%+a-z.A-Z0-9\-_]+\.[a-zA-Z]{{1,10}})[:-](\d+){TERMINATOR}"));

static JUST_FILE: LazyLock<String> =
    LazyLock::new(|| format!(r"([@%+a-z.A-Z0-9\-_]+\.[a-zA-Z]{{1,10}}){TERMINATOR}"));

static JUST_EMACS_TEMP_FILE: LazyLock<String> =
    LazyLock::new(|| format!(r"([@%+a-z.A-Z0-9\-_]+\.[a-zA-Z]{{1,10}}~){TERMINATOR}"));

static JUST_VIM_TEMP_FILE: LazyLock<String> =
    LazyLock::new(|| format!(r"(#[@%+a-z.A-Z0-9\-_]+\.[a-zA-Z]{{1,10}}#){TERMINATOR}"));

// starts with a normal char for ls -l output
static JUST_FILE_WITH_SPACES: LazyLock<String> =
    LazyLock::new(|| format!(r"([a-zA-Z][@+a-z. A-Z0-9\-_]+\.[a-zA-Z]{{1,10}}){TERMINATOR}"));

static FILE_NO_PERIODS: LazyLock<String> = LazyLock::new(|| {
    format!(
        concat!(
            r"(",
            // dotfiles with at least 3 characters after the dot
            r"((/?([a-z.A-Z0-9\-_]+/))?\.[a-zA-Z0-9\-_]{{3,}}[a-zA-Z0-9\-_/]*)",
            r"|",
            // files containing at least one slash
            r"([a-z.A-Z0-9\-_/]+/[a-zA-Z0-9\-_]+)",
            r"|",
            // capitalized *file words, e.g. Makefile
            r"([A-Z][a-zA-Z]{{2,}}file)",
            r"){}",
        ),
        TERMINATOR
    )
});

// The 'character class' before each '/' is either a plain character or a
// space followed by one, which admits single spaces inside directory names
// while rejecting runs of spaces and trailing spaces:
//
//   /something foo/   and   / a b c d e/   match
//   /two  spaces/     and   /ends in a space /   do not
const DIR_WITH_SPACES: &str = r"(([a-z.A-Z0-9\-_]|\s[a-zA-Z0-9\-_])+/)+";

static MASTER_WITH_SPACES: LazyLock<String> = LazyLock::new(|| {
    format!(
        concat!(
            r"(",
            r"(?:\.?/)?",
            r"{}",
            // filename part: same char-or-space-then-char trick, plus the
            // retina-file tokens like @ and ()
            r"([(),%@a-zA-Z0-9\-_+.]|\s[,()@%a-zA-Z0-9\-_+.])+",
            // extensions don't allow spaces
            r"\.[a-zA-Z0-9-]{{1,30}}",
            r")",
            r"[:-]?(\d+)?",
        ),
        DIR_WITH_SPACES
    )
});

static MASTER_WITH_SPACES_AND_WEIRD_FILES: LazyLock<String> = LazyLock::new(|| {
    format!(
        concat!(
            r"(",
            r"(?:\.?/)?",
            r"{}",
            // dotfiles with at least 3 characters after the dot
            r"((/?([a-z.A-Z0-9\-_]+/))?\.[a-zA-Z0-9\-_]{{3,}}[a-zA-Z0-9\-_/]*)",
            r"|",
            r"([a-z.A-Z0-9\-_/]+/[a-zA-Z0-9\-_]+)",
            r"|",
            r"([A-Z][a-zA-Z]{{2,}}file)",
            r")",
        ),
        DIR_WITH_SPACES
    )
});

pub static REGEX_WATERFALL: LazyLock<Vec<RegexConfig>> = LazyLock::new(|| {
    vec![
        // Homedirs need a separate pattern.
        config("HOMEDIR", HOMEDIR),
        // The master pattern matches grep-service results with line numbers,
        // so it runs early; when the other-result pattern also matched and
        // started earlier in the line, that one wins.
        RegexConfig {
            preferred: Some(Regex::new(OTHER_BGS_RESULT).expect("OTHER_BGS_RESULT")),
            ..config("MASTER", MASTER)
        },
        config("OTHER_BGS_RESULT", OTHER_BGS_RESULT),
        RegexConfig {
            only_with_file_inspection: true,
            ..config("MASTER_MORE_EXTENSIONS", MASTER_MORE_EXTENSIONS)
        },
        // Spaces everywhere would overmatch badly, so these two only run
        // when filesystem validation can filter the candidates.
        RegexConfig {
            num_group: 5,
            only_with_file_inspection: true,
            ..config("MASTER_WITH_SPACES", &MASTER_WITH_SPACES)
        },
        RegexConfig {
            num_group: 5,
            only_with_file_inspection: true,
            ..config(
                "MASTER_WITH_SPACES_AND_WEIRD_FILES",
                &MASTER_WITH_SPACES_AND_WEIRD_FILES,
            )
        },
        // Vim swap-style files: #example.txt#
        RegexConfig {
            no_num: true,
            ..config("JUST_VIM_TEMP_FILE", &JUST_VIM_TEMP_FILE)
        },
        // Emacs backup files: example.txt~
        RegexConfig {
            no_num: true,
            ..config("JUST_EMACS_TEMP_FILE", &JUST_EMACS_TEMP_FILE)
        },
        // File without a directory plus a number, e.g. grep -n output:
        //   A.txt:100 my_pattern
        RegexConfig {
            num_group: 2,
            ..config("JUST_FILE_WITH_NUMBER", &JUST_FILE_WITH_NUMBER)
        },
        RegexConfig {
            no_num: true,
            ..config("JUST_FILE", &JUST_FILE)
        },
        RegexConfig {
            no_num: true,
            only_with_file_inspection: true,
            ..config("JUST_FILE_WITH_SPACES", &JUST_FILE_WITH_SPACES)
        },
        // Tested last since it is the loosest of the non-catch-all set; it
        // still demands a minimum of slashes or filename length so things
        // like cx('foo/root') don't match.
        RegexConfig {
            no_num: true,
            ..config("FILE_NO_PERIODS", &FILE_NO_PERIODS)
        },
        RegexConfig {
            no_num: true,
            with_all_lines_matched: true,
            ..config(
                "ENTIRE_TRIMMED_LINE_IF_NOT_WHITESPACE",
                ENTIRE_TRIMMED_LINE_IF_NOT_WHITESPACE,
            )
        },
    ]
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waterfall_compiles_in_order() {
        let names: Vec<_> = REGEX_WATERFALL.iter().map(|c| c.name).collect();
        assert_eq!(names[0], "HOMEDIR");
        assert_eq!(names[1], "MASTER");
        assert_eq!(*names.last().unwrap(), "ENTIRE_TRIMMED_LINE_IF_NOT_WHITESPACE");
        assert_eq!(names.len(), 13);
    }

    #[test]
    fn master_captures_path_and_number() {
        let master = &REGEX_WATERFALL[1].regex;
        let caps = master.captures("foo/bar/baz.py:12").unwrap();
        assert_eq!(&caps[1], "foo/bar/baz.py");
        assert_eq!(&caps[3], "12");
    }

    #[test]
    fn other_result_requires_number() {
        let other = &REGEX_WATERFALL[2].regex;
        assert!(other.is_match("foo/bar/TARGETS:23"));
        assert!(!other.is_match("foo/bar/TARGETS"));
    }

    #[test]
    fn dir_with_spaces_rejects_double_spaces() {
        let spaces = &REGEX_WATERFALL[4].regex;
        let caps = spaces
            .captures("./annoying Spaces Folder/evilFile With Space2.txt")
            .unwrap();
        assert_eq!(&caps[1], "./annoying Spaces Folder/evilFile With Space2.txt");
        // a doubled space cannot be part of a directory component, so the
        // capture restarts past it
        let caps = spaces.captures("/two  spaces  here/foo.txt").unwrap();
        assert_eq!(&caps[1], "here/foo.txt");
    }
}

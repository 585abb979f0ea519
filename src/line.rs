//! Line variants for the picker.
//!
//! Every input line becomes either a [`SimpleLine`] (display only) or a
//! [`MatchedLine`] (selectable, hoverable, and decorated when rendered).
//! Lines are created once by the ingest pass, persisted, and never mutated
//! afterwards beyond the `selected` / `hovered` / `truncated` flags.

use crate::ansi::{
    self, BOLD_ATTRIBUTE, Format, FormattedText, UNDERLINE_ATTRIBUTE,
};
use crate::extract::{self, MatchResult, Runtime};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

/// Prefix shown in front of a selected match.
pub const ARROW_DECORATOR: &str = "|===>";
/// Inserted between the two halves of a match that is too long to show
/// whole, so it reads like `./src/foo/bar/something|...|baz/foo.py`.
pub const TRUNCATE_DECORATOR: &str = "|...|";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Line {
    Simple(SimpleLine),
    Match(MatchedLine),
}

impl Line {
    pub fn index(&self) -> usize {
        match self {
            Line::Simple(line) => line.index,
            Line::Match(line) => line.index,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, Line::Match(_))
    }

    pub fn as_match(&self) -> Option<&MatchedLine> {
        match self {
            Line::Match(line) => Some(line),
            Line::Simple(_) => None,
        }
    }

    pub fn as_match_mut(&mut self) -> Option<&mut MatchedLine> {
        match self {
            Line::Match(line) => Some(line),
            Line::Simple(_) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleLine {
    pub text: FormattedText,
    pub index: usize,
}

impl SimpleLine {
    pub fn new(text: FormattedText, index: usize) -> Self {
        Self { text, index }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchedLine {
    pub text: FormattedText,
    pub index: usize,
    /// The resolved path (absolute, tilde-expanded, `./`-relative, or
    /// repo-root-prefixed). In all-input mode the raw match is kept.
    pub path: String,
    /// Line number within the file; 0 means none was captured.
    pub num: usize,
    /// Character span of the match in the plain line, right-trimmed of
    /// whitespace the looser patterns are happy to swallow.
    pub start: usize,
    pub end: usize,
    /// The matched text itself, span-trimmed the same way.
    pub matched: String,
    pub all_input: bool,
    pub selected: bool,
    pub hovered: bool,
    pub truncated: bool,
}

impl MatchedLine {
    pub fn new(
        text: FormattedText,
        result: MatchResult,
        index: usize,
        validate_file_exists: bool,
        all_input: bool,
        runtime: &Runtime,
    ) -> Self {
        let path = if all_input {
            result.path
        } else {
            extract::prepend_dir(&result.path, validate_file_exists, runtime)
        };

        let plain: Vec<char> = text.plain().chars().collect();
        let start = result.start;
        let mut end = result.end.min(plain.len());

        // matches like README are aggressive about including whitespace, so
        // pull the span end back over any trailing blanks
        let subset: String = plain[start..end].iter().collect();
        let trailing_whitespace = subset.chars().count() - subset.trim_end().chars().count();
        end -= trailing_whitespace;
        let matched: String = plain[start..end].iter().collect();

        Self {
            text,
            index,
            path,
            num: result.num,
            start,
            end,
            matched,
            all_input,
            selected: false,
            hovered: false,
            truncated: false,
        }
    }

    /// The formatted text up to the start of the match.
    pub fn before_text(&self) -> FormattedText {
        self.text.break_at(self.start).0
    }

    /// The formatted text from the end of the match onward.
    pub fn after_text(&self) -> FormattedText {
        self.text.break_at(self.end).1
    }

    pub fn decorator(&self) -> &'static str {
        if self.selected { ARROW_DECORATOR } else { "" }
    }

    /// The format of the decorated middle, derived from hover/selection
    /// state.
    pub fn decoration_format(&self) -> Format {
        if self.hovered && self.selected {
            Format::new(ansi::COLOR_WHITE, ansi::COLOR_RED, BOLD_ATTRIBUTE)
        } else if self.hovered {
            Format::new(ansi::COLOR_WHITE, ansi::COLOR_BLUE, BOLD_ATTRIBUTE)
        } else if self.selected {
            Format::new(ansi::COLOR_WHITE, ansi::COLOR_GREEN, BOLD_ATTRIBUTE)
        } else if self.all_input {
            Format::default()
        } else {
            Format::new(-1, -1, UNDERLINE_ATTRIBUTE)
        }
    }

    /// The plain text of the decorated middle: the arrow decorator plus the
    /// match, center-truncated around [`TRUNCATE_DECORATOR`] when the
    /// combination with the before-text would overflow `max_len` columns.
    pub fn decorated_plain(&self, max_len: Option<usize>) -> String {
        let decorator = self.decorator();
        let plain = format!("{}{}", decorator, self.matched);
        let Some(max_len) = max_len else {
            return plain;
        };

        let before_len = self.before_text().len();
        if plain.chars().count() + before_len <= max_len {
            return plain;
        }

        // chop the ends off the decorated match and glue them back together
        // around the truncation marker; the before text stays visible so its
        // length counts against the available space too
        let space_allowed = max_len
            .saturating_sub(TRUNCATE_DECORATOR.chars().count())
            .saturating_sub(decorator.chars().count())
            .saturating_sub(before_len);
        let mid_point = space_allowed / 2;
        let chars: Vec<char> = plain.chars().collect();
        let begin: String = chars.iter().take(mid_point).collect();
        let tail: String = chars[chars.len().saturating_sub(mid_point)..].iter().collect();
        format!("{begin}{TRUNCATE_DECORATOR}{tail}")
    }

    /// The decorated middle as formatted text.
    pub fn decorated_text(&self, max_len: Option<usize>) -> FormattedText {
        FormattedText::styled(self.decoration_format(), self.decorated_plain(max_len))
    }

    pub fn is_resolvable(&self) -> bool {
        !self.is_git_abbreviated_path()
    }

    /// `.../` paths out of git's abbreviation cannot be resolved; they are
    /// kept so the UI can warn about them.
    pub fn is_git_abbreviated_path(&self) -> bool {
        self.path.split('/').next() == Some("...")
    }

    pub fn dir(&self) -> String {
        Path::new(&self.path)
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    // Description-pane metadata. These read the filesystem on demand.

    pub fn file_size(&self) -> io::Result<String> {
        let mut size = fs::metadata(&self.path)?.len();
        for unit in ["B", "K", "M", "G", "T", "P", "E", "Z"] {
            if size < 1024 {
                return Ok(format!("size: {size}{unit}"));
            }
            size /= 1024;
        }
        Ok(format!("size: {size}Y"))
    }

    pub fn length_in_lines(&self) -> io::Result<String> {
        let count = fs::read(&self.path)?
            .iter()
            .filter(|&&b| b == b'\n')
            .count();
        let caption = if count > 1 { "lines" } else { "line" };
        Ok(format!("length: {count} {caption}"))
    }

    pub fn time_last_accessed(&self) -> io::Result<String> {
        let accessed = fs::metadata(&self.path)?.accessed()?;
        Ok(format!("last accessed: {}", format_time(accessed)))
    }

    pub fn time_last_modified(&self) -> io::Result<String> {
        let modified = fs::metadata(&self.path)?.modified()?;
        Ok(format!("last modified: {}", format_time(modified)))
    }

    #[cfg(unix)]
    pub fn owner_user(&self) -> io::Result<String> {
        use std::os::unix::fs::MetadataExt;
        let uid = fs::metadata(&self.path)?.uid();
        let name = owner::user_name(uid).unwrap_or_else(|| uid.to_string());
        Ok(format!("owned by user: {name}, {uid}"))
    }

    #[cfg(unix)]
    pub fn owner_group(&self) -> io::Result<String> {
        use std::os::unix::fs::MetadataExt;
        let gid = fs::metadata(&self.path)?.gid();
        let name = owner::group_name(gid).unwrap_or_else(|| gid.to_string());
        Ok(format!("owned by group: {name}, {gid}"))
    }

    #[cfg(not(unix))]
    pub fn owner_user(&self) -> io::Result<String> {
        Ok("owned by user: unknown".to_string())
    }

    #[cfg(not(unix))]
    pub fn owner_group(&self) -> io::Result<String> {
        Ok("owned by group: unknown".to_string())
    }
}

fn format_time(time: std::time::SystemTime) -> String {
    chrono::DateTime::<chrono::Local>::from(time)
        .format("%m/%d/%Y %H:%M:%S")
        .to_string()
}

#[cfg(unix)]
mod owner {
    use std::ffi::CStr;

    pub fn user_name(uid: u32) -> Option<String> {
        let mut buf = vec![0_u8; 1024];
        let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
        let mut result: *mut libc::passwd = std::ptr::null_mut();
        // SAFETY: getpwuid_r writes into the provided buffers and sets
        // `result` to null when no entry exists
        let ret = unsafe {
            libc::getpwuid_r(
                uid,
                &mut pwd,
                buf.as_mut_ptr() as *mut libc::c_char,
                buf.len(),
                &mut result,
            )
        };
        if ret != 0 || result.is_null() {
            return None;
        }
        // SAFETY: pw_name points into buf, which outlives this borrow
        let name = unsafe { CStr::from_ptr(pwd.pw_name) };
        Some(name.to_string_lossy().into_owned())
    }

    pub fn group_name(gid: u32) -> Option<String> {
        let mut buf = vec![0_u8; 1024];
        let mut grp: libc::group = unsafe { std::mem::zeroed() };
        let mut result: *mut libc::group = std::ptr::null_mut();
        // SAFETY: same contract as getpwuid_r
        let ret = unsafe {
            libc::getgrgid_r(
                gid,
                &mut grp,
                buf.as_mut_ptr() as *mut libc::c_char,
                buf.len(),
                &mut result,
            )
        };
        if ret != 0 || result.is_null() {
            return None;
        }
        // SAFETY: gr_name points into buf, which outlives this borrow
        let name = unsafe { CStr::from_ptr(grp.gr_name) };
        Some(name.to_string_lossy().into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::match_line;

    fn matched(input: &str) -> MatchedLine {
        let runtime = Runtime::new("/repo");
        let text = FormattedText::parse(input);
        let result = match_line(&text.plain(), false, false, &runtime)
            .unwrap_or_else(|| panic!("no match in {input:?}"));
        MatchedLine::new(text, result, 0, false, false, &runtime)
    }

    #[test]
    fn match_resolves_path_through_repo_root() {
        let line = matched("foo/bar/TARGETS:23");
        assert_eq!(line.path, "/repo/foo/bar/TARGETS");
        assert_eq!(line.num, 23);
    }

    #[test]
    fn span_is_trimmed_of_trailing_whitespace() {
        let line = matched("flib/foo/bar   ");
        assert_eq!(line.matched, "flib/foo/bar");
        assert_eq!(line.end, "flib/foo/bar".len());
        assert_eq!(line.after_text().plain(), "   ");
    }

    #[test]
    fn before_and_after_split_around_match() {
        let line = matched("banana hanana Wilde/ads/story.m tail");
        assert_eq!(line.before_text().plain(), "banana hanana ");
        assert!(line.matched.starts_with("Wilde/ads/story.m"));
        let whole = format!(
            "{}{}{}",
            line.before_text().plain(),
            line.matched,
            line.after_text().plain()
        );
        assert_eq!(whole, "banana hanana Wilde/ads/story.m tail");
    }

    #[test]
    fn decoration_follows_state() {
        let mut line = matched("html/js/hotness.js");
        assert_eq!(
            line.decoration_format(),
            Format::new(-1, -1, UNDERLINE_ATTRIBUTE)
        );
        line.hovered = true;
        assert_eq!(
            line.decoration_format(),
            Format::new(ansi::COLOR_WHITE, ansi::COLOR_BLUE, BOLD_ATTRIBUTE)
        );
        line.selected = true;
        assert_eq!(
            line.decoration_format(),
            Format::new(ansi::COLOR_WHITE, ansi::COLOR_RED, BOLD_ATTRIBUTE)
        );
        line.hovered = false;
        assert_eq!(
            line.decoration_format(),
            Format::new(ansi::COLOR_WHITE, ansi::COLOR_GREEN, BOLD_ATTRIBUTE)
        );
    }

    #[test]
    fn selected_match_gets_arrow_decorator() {
        let mut line = matched("html/js/hotness.js");
        assert_eq!(line.decorated_plain(None), "html/js/hotness.js");
        line.selected = true;
        assert_eq!(line.decorated_plain(None), "|===>html/js/hotness.js");
    }

    #[test]
    fn long_match_truncates_in_the_center() {
        let line = matched("src/foo/bar/really/long/path/down/here/something.py");
        let truncated = line.decorated_plain(Some(30));
        assert!(truncated.contains(TRUNCATE_DECORATOR));
        assert!(truncated.chars().count() <= 30);
        assert!(truncated.starts_with("src/"));
        assert!(truncated.ends_with("something.py".split_at(9).1));
    }

    #[test]
    fn short_match_is_left_alone_by_truncation() {
        let line = matched("foo/bar.py");
        assert_eq!(line.decorated_plain(Some(80)), "foo/bar.py");
    }

    #[test]
    fn git_abbreviated_path_is_unresolvable() {
        let runtime = Runtime::new("/repo");
        let text = FormattedText::parse(".../something/foo.py");
        let result = match_line(&text.plain(), false, false, &runtime).unwrap();
        let line = MatchedLine::new(text, result, 0, false, false, &runtime);
        assert!(!line.is_resolvable());
        assert!(line.is_git_abbreviated_path());
    }

    #[test]
    fn resolvable_for_ordinary_matches() {
        assert!(matched("html/js/hotness.js").is_resolvable());
        assert!(matched("/abs/path/file.txt").is_resolvable());
    }

    #[test]
    fn all_input_match_keeps_raw_text_and_skips_decoration() {
        let runtime = Runtime::new("/repo");
        let text = FormattedText::parse("  some branch name  ");
        let result = match_line(&text.plain(), false, true, &runtime).unwrap();
        let line = MatchedLine::new(text, result, 3, false, true, &runtime);
        assert_eq!(line.path, "some branch name");
        assert_eq!(line.decoration_format(), Format::default());
    }

    #[test]
    fn formatted_input_keeps_colors_around_the_match() {
        let runtime = Runtime::new("/repo");
        let text = FormattedText::parse("\x1b[31mM\x1b[0m html/js/hotness.js");
        let result = match_line(&text.plain(), false, false, &runtime).unwrap();
        let line = MatchedLine::new(text, result, 0, false, false, &runtime);
        assert_eq!(line.before_text().plain(), "M ");
        assert_eq!(line.matched, "html/js/hotness.js");
    }
}

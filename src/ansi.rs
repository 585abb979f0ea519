//! ANSI-formatted text model.
//!
//! Piped input arrives with SGR escape sequences embedded in it (git and grep
//! both color their output when asked to). We keep the formatting alongside
//! the plain text so lines render in their original colors, and so a line can
//! be split at an arbitrary plain-text offset without losing the style that
//! was active at the split point.
//!
//! The segment list alternates `Format` and `Text` entries and always begins
//! with a `Format` (possibly the default one). Even indexes are formats, odd
//! indexes are text; the plain-text view is the concatenation of the text
//! segments. All offsets in this module are plain-text *character* offsets.

use ratatui::style::{Color, Modifier, Style};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static ANSI_ESCAPE_FORMATTING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[([^mK]*)[mK]").expect("invalid ANSI splitter"));

pub const BOLD_ATTRIBUTE: u8 = 1;
pub const UNDERLINE_ATTRIBUTE: u8 = 4;

const FOREGROUND_RANGE: (i16, i16) = (30, 39);
const BACKGROUND_RANGE: (i16, i16) = (40, 49);

/// Color indexes used by the selection decorations.
pub const COLOR_RED: i16 = 1;
pub const COLOR_GREEN: i16 = 2;
pub const COLOR_BLUE: i16 = 4;
pub const COLOR_WHITE: i16 = 7;

/// A parsed SGR formatting run: foreground and background color indexes
/// (`-1` means "terminal default") plus a bold/underline attribute bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Format {
    pub fg: i16,
    pub bg: i16,
    pub attrs: u8,
}

impl Format {
    pub fn new(fg: i16, bg: i16, attrs: u8) -> Self {
        Self { fg, bg, attrs }
    }

    /// Parse the numeric codes of one SGR sequence (the part between `ESC[`
    /// and the final `m`/`K`). Codes 30-39 select the foreground, 40-49 the
    /// background, 1 is bold, 4 is underline. Anything else is ignored; an
    /// empty sequence is a reset. Each format fully replaces the previous
    /// attribute state, so reset falls out of the defaults.
    pub fn parse(formatting: &str) -> Self {
        let mut format = Format {
            fg: -1,
            bg: -1,
            attrs: 0,
        };
        for code in formatting.split(';').filter_map(|v| v.parse::<i16>().ok()) {
            if (FOREGROUND_RANGE.0..=FOREGROUND_RANGE.1).contains(&code) {
                format.fg = code - FOREGROUND_RANGE.0;
            } else if (BACKGROUND_RANGE.0..=BACKGROUND_RANGE.1).contains(&code) {
                format.bg = code - BACKGROUND_RANGE.0;
            } else if code == BOLD_ATTRIBUTE as i16 {
                format.attrs |= BOLD_ATTRIBUTE;
            } else if code == UNDERLINE_ATTRIBUTE as i16 {
                format.attrs |= UNDERLINE_ATTRIBUTE;
            }
        }
        format
    }

    /// Re-serialize this format as a fully formed escape sequence. Only
    /// non-default fields are emitted so that parsing the sequence yields
    /// this exact format back.
    pub fn to_sequence(self) -> String {
        let mut codes: Vec<String> = Vec::new();
        if self.fg >= 0 {
            codes.push((FOREGROUND_RANGE.0 + self.fg).to_string());
        }
        if self.bg >= 0 {
            codes.push((BACKGROUND_RANGE.0 + self.bg).to_string());
        }
        if self.attrs & BOLD_ATTRIBUTE != 0 {
            codes.push(BOLD_ATTRIBUTE.to_string());
        }
        if self.attrs & UNDERLINE_ATTRIBUTE != 0 {
            codes.push(UNDERLINE_ATTRIBUTE.to_string());
        }
        if codes.is_empty() {
            codes.push("0".to_string());
        }
        format!("\x1b[{}m", codes.join(";"))
    }

    /// The ratatui style for this format. The (0, 0) color pair maps to the
    /// terminal default, matching the hardcoded white-on-black pair 0 of the
    /// curses world this model came from.
    pub fn style(self) -> Style {
        let mut style = Style::default();
        let default_pair = (self.fg == 0 && self.bg == 0) || (self.fg == -1 && self.bg == -1);
        if !default_pair {
            if self.fg >= 0 {
                style = style.fg(Color::Indexed(self.fg as u8));
            }
            if self.bg >= 0 {
                style = style.bg(Color::Indexed(self.bg as u8));
            }
        }
        if self.attrs & BOLD_ATTRIBUTE != 0 {
            style = style.add_modifier(Modifier::BOLD);
        }
        if self.attrs & UNDERLINE_ATTRIBUTE != 0 {
            style = style.add_modifier(Modifier::UNDERLINED);
        }
        style
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Segment {
    Format(Format),
    Text(String),
}

/// A piece of ANSI-formatted text: the plain view is available through
/// [`FormattedText::plain`], and the formatting survives [`FormattedText::break_at`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FormattedText {
    segments: Vec<Segment>,
}

impl FormattedText {
    /// Parse raw terminal output into alternating format/text segments.
    /// The result always starts with a format segment so that index parity
    /// is stable.
    pub fn parse(text: &str) -> Self {
        let mut segments = vec![Segment::Format(Format::default())];
        let mut last = 0;
        for caps in ANSI_ESCAPE_FORMATTING.captures_iter(text) {
            let whole = caps.get(0).expect("match has no span");
            segments.push(Segment::Text(text[last..whole.start()].to_string()));
            segments.push(Segment::Format(Format::parse(&caps[1])));
            last = whole.end();
        }
        segments.push(Segment::Text(text[last..].to_string()));
        Self { segments }
    }

    fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// A single run of text under one format. Used to build the decorated
    /// middle of a matched line.
    pub fn styled(format: Format, text: String) -> Self {
        Self {
            segments: vec![Segment::Format(format), Segment::Text(text)],
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The concatenated text segments, stripped of all formatting.
    pub fn plain(&self) -> String {
        self.segments
            .iter()
            .filter_map(|seg| match seg {
                Segment::Text(t) => Some(t.as_str()),
                Segment::Format(_) => None,
            })
            .collect()
    }

    /// Plain-text length in characters.
    pub fn len(&self) -> usize {
        self.segments
            .iter()
            .map(|seg| match seg {
                Segment::Text(t) => t.chars().count(),
                Segment::Format(_) => 0,
            })
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Locate the text segment containing the `offset`-th plain character.
    /// Returns the segment index and the character position inside it; an
    /// offset equal to the total length lands at the end of the last text
    /// segment.
    fn find_segment_place(&self, offset: usize) -> (usize, usize) {
        let mut to_go = offset;
        let mut last_text = 0;
        for (index, seg) in self.segments.iter().enumerate() {
            if let Segment::Text(t) = seg {
                let chars = t.chars().count();
                if to_go < chars {
                    return (index, to_go);
                }
                to_go -= chars;
                last_text = index;
            }
        }
        (last_text, self.last_text_len(last_text))
    }

    fn last_text_len(&self, index: usize) -> usize {
        match &self.segments[index] {
            Segment::Text(t) => t.chars().count(),
            Segment::Format(_) => 0,
        }
    }

    /// Split at the given plain-text character offset. The plain texts of the
    /// two halves concatenate back to the original, and the right half starts
    /// with the format that was active at the split point.
    pub fn break_at(&self, offset: usize) -> (FormattedText, FormattedText) {
        let (index, split_point) = self.find_segment_place(offset);
        let Segment::Text(text_segment) = &self.segments[index] else {
            unreachable!("find_segment_place always lands on a text segment");
        };

        let byte_split = text_segment
            .char_indices()
            .nth(split_point)
            .map(|(i, _)| i)
            .unwrap_or(text_segment.len());
        let (before_text, after_text) = text_segment.split_at(byte_split);

        let format_for_segment = match &self.segments[index - 1] {
            Segment::Format(f) => *f,
            Segment::Text(_) => Format::default(),
        };

        let mut before = self.segments[..index].to_vec();
        before.push(Segment::Text(before_text.to_string()));

        let mut after = vec![
            Segment::Format(format_for_segment),
            Segment::Text(after_text.to_string()),
        ];
        after.extend_from_slice(&self.segments[index + 1..]);

        (
            FormattedText::from_segments(before),
            FormattedText::from_segments(after),
        )
    }

    /// Re-serialize into a raw string with escape sequences, such that
    /// parsing it again yields the same segment list. The leading default
    /// format is implicit in parsing, so it is not emitted.
    pub fn to_sequence_string(&self) -> String {
        let mut out = String::new();
        for (index, seg) in self.segments.iter().enumerate() {
            match seg {
                Segment::Format(f) => {
                    if index > 0 || *f != Format::default() {
                        out.push_str(&f.to_sequence());
                    }
                }
                Segment::Text(t) => out.push_str(t),
            }
        }
        out
    }
}

impl std::fmt::Display for FormattedText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.plain())
    }
}

//! Frame rendering: content lines, scrollbar, chrome, quick-select labels,
//! the description pane, and the command prompt.
//!
//! Drawing is cursor-addressed through [`Painter`], which clips every write
//! to the buffer so a resize race can never push a write out of bounds.

use crate::ansi::{self, Format, FormattedText, Segment};
use crate::keybindings::Mode;
use crate::line::{Line, MatchedLine};
use crate::tui::app::{App, CHROME_MIN_Y, LABELS, SIDEBAR_WIDTH};
use crate::tui::help_text;
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::style::Style;
use unicode_width::UnicodeWidthChar;

/// A thin wrapper over the frame buffer that carries the current attribute
/// state, the way a curses color printer would.
pub struct Painter<'a> {
    buf: &'a mut Buffer,
    current: Style,
}

impl<'a> Painter<'a> {
    pub fn new(buf: &'a mut Buffer) -> Self {
        Self {
            buf,
            current: Style::default(),
        }
    }

    fn width(&self) -> i32 {
        self.buf.area.width as i32
    }

    fn height(&self) -> i32 {
        self.buf.area.height as i32
    }

    /// Update the attribute state used by [`Painter::addstr_current`].
    /// Nothing is restored afterwards; callers set their own attributes.
    pub fn set_attributes(&mut self, style: Style) {
        self.current = style;
    }

    /// Write a string at (y, x), silently dropping anything out of bounds.
    pub fn addstr(&mut self, y: i32, x: i32, text: &str, style: Style) {
        if y < 0 || y >= self.height() || x < 0 || x >= self.width() {
            return;
        }
        let max_width = (self.width() - x) as usize;
        self.buf
            .set_stringn(x as u16, y as u16, text, max_width, style);
    }

    pub fn addstr_current(&mut self, y: i32, x: i32, text: &str) {
        let style = self.current;
        self.addstr(y, x, text, style);
    }
}

/// Emit formatted text segments left to right, updating the painter's
/// attributes on each format segment and truncating at `max_len` plain
/// characters.
pub fn print_formatted(
    painter: &mut Painter,
    y: i32,
    x: i32,
    text: &FormattedText,
    max_len: usize,
) {
    let mut printed = 0usize;
    for segment in text.segments() {
        if printed >= max_len {
            break;
        }
        match segment {
            Segment::Format(format) => painter.set_attributes(format.style()),
            Segment::Text(chunk) => {
                let to_print: String = chunk.chars().take(max_len - printed).collect();
                painter.addstr_current(y, x + printed as i32, &to_print);
                printed += to_print.chars().count();
            }
        }
    }
}

pub fn render(frame: &mut Frame, app: &mut App) {
    let mut cursor: Option<(u16, u16)> = None;
    {
        let buf = frame.buffer_mut();
        let mut painter = Painter::new(buf);

        if app.show_command_warning {
            render_sidebar(&mut painter, app);
            render_bottom_bar(&mut painter, app);
            render_command_warning(&mut painter, app);
        } else if app.mode == Mode::Command {
            render_sidebar(&mut painter, app);
            render_bottom_bar(&mut painter, app);
            cursor = render_command_prompt(&mut painter, app);
        } else {
            render_lines(&mut painter, app);
            render_scrollbar(&mut painter, app);
            if app.mode == Mode::QuickSelect {
                render_labels(&mut painter, app);
            }
            let sidebar_y = render_sidebar(&mut painter, app);
            render_bottom_bar(&mut painter, app);
            if let (Some(sidebar_y), Some(index)) = (sidebar_y, app.description_index) {
                render_description(&mut painter, app, sidebar_y, index);
            }
        }
    }
    // block cursor only in command mode; hidden otherwise (ratatui hides it
    // unless a position is set)
    if let Some(position) = cursor {
        frame.set_cursor_position(position);
    }
}

fn render_lines(painter: &mut Painter, app: &mut App) {
    let bounds = app.chrome_boundaries();
    let (_, min_y, _, max_y) = bounds;
    let scroll_offset = app.scroll_offset;
    let indexes: Vec<usize> = app.lines.keys().copied().collect();
    for index in indexes {
        let y = min_y as i32 + index as i32 + scroll_offset;
        if y < min_y as i32 || y >= max_y as i32 {
            // won't be displayed
            continue;
        }
        match app.lines.get_mut(&index) {
            Some(Line::Simple(line)) => {
                let (min_x, _, max_x, _) = bounds;
                let space = max_x.saturating_sub(min_x) as usize;
                print_formatted(painter, y, min_x as i32, &line.text, space);
            }
            Some(Line::Match(line)) => render_match(painter, bounds, y, line),
            None => {}
        }
    }
}

fn render_match(
    painter: &mut Painter,
    bounds: (u16, u16, u16, u16),
    y: i32,
    line: &mut MatchedLine,
) {
    let (min_x, _, max_x, _) = bounds;
    let space = max_x.saturating_sub(min_x) as usize;

    let before = line.before_text();
    // everything through the decorated match must be visible; the after
    // text is expendable
    let important = before.len() + line.decorated_plain(None).chars().count();
    let decorated = if important > space {
        line.truncated = true;
        line.decorated_text(Some(space))
    } else {
        // a resize may have grown the room back since we truncated
        if line.truncated && before.len() + line.matched.chars().count() < space {
            line.truncated = false;
        }
        line.decorated_text(None)
    };
    let after = line.after_text();

    let mut x = min_x as i32;
    let mut remaining = space;
    for part in [&before, &decorated, &after] {
        if remaining == 0 {
            break;
        }
        let printable = part.len().min(remaining);
        print_formatted(painter, y, x, part, printable);
        x += printable as i32;
        remaining -= printable;
    }
}

fn render_scrollbar(painter: &mut Painter, app: &App) {
    if !app.scrollbar_activated() {
        return;
    }
    let rows = app.rows as i32;
    let num_lines = app.num_lines() as f64;
    let min_y = CHROME_MIN_Y as i32 + 1;
    let style = Style::default();

    for y in [min_y - 1, rows - 1] {
        painter.addstr(y, 0, "===", style);
    }
    for y in min_y..rows - 1 {
        painter.addstr(y, 0, " . ", style);
    }

    // the thumb covers the visible fraction, anchored at the scroll position
    let frac_displayed = (rows as f64 / num_lines).min(1.0);
    let box_start_fraction = f64::from(-app.scroll_offset) / num_lines;
    let box_stop_fraction = box_start_fraction + frac_displayed;

    let top_y = rows - 2;
    let diff = top_y - min_y;
    let box_start_y = (diff as f64 * box_start_fraction) as i32 + min_y;
    let box_stop_y = (diff as f64 * box_stop_fraction) as i32 + min_y;

    painter.addstr(box_start_y, 0, "/-\\", style);
    for y in box_start_y + 1..box_stop_y {
        painter.addstr(y, 0, "|-|", style);
    }
    painter.addstr(box_stop_y, 0, "\\-/", style);
}

fn render_labels(painter: &mut Painter, app: &App) {
    let top_y = app.rows as i32 - 2;
    let labels: Vec<char> = LABELS.chars().collect();
    for y in 0..=top_y {
        let Some(label) = labels.get(y as usize) else {
            break;
        };
        painter.addstr(y, 1, &label.to_string(), Style::default());
    }
}

/// The wide-terminal usage sidebar. Returns the row of its last usage line
/// so the description pane knows where to start.
fn render_sidebar(painter: &mut Painter, app: &App) -> Option<i32> {
    if !app.is_sidebar_mode() {
        return None;
    }
    let rows = app.rows as i32;
    let min_y = CHROME_MIN_Y as i32;
    let border_x = if app.mode == Mode::Command {
        help_text::SHORT_COMMAND_PROMPT.len() as i32 + 20
    } else {
        app.cols as i32 - SIDEBAR_WIDTH as i32
    };
    let usage = if app.mode == Mode::Command {
        help_text::USAGE_COMMAND
    } else {
        help_text::USAGE_PAGE
    };
    let style = Style::default();
    let mut sidebar_y = min_y;
    for (index, usage_line) in usage.lines().enumerate() {
        sidebar_y = min_y + index as i32;
        painter.addstr(sidebar_y, border_x + 2, usage_line, style);
    }
    for y in min_y..rows {
        painter.addstr(y, border_x, "|", style);
    }
    Some(sidebar_y)
}

fn render_bottom_bar(painter: &mut Painter, app: &App) {
    if app.is_sidebar_mode() {
        return;
    }
    let rows = app.rows as i32;
    let cols = app.cols as i32;
    let border_y = rows - 2;
    let usage = match app.mode {
        Mode::Command => help_text::SHORT_COMMAND_USAGE.to_string(),
        _ => help_text::short_nav_usage(app.options.all_input),
    };
    let min_x = if app.mode == Mode::Command {
        0
    } else {
        app.chrome_boundaries().0 as i32
    };
    let style = Style::default();
    let border = "_".repeat((cols - min_x).max(0) as usize);
    painter.addstr(border_y, min_x, &border, style);
    painter.addstr(border_y + 1, min_x, &usage, style);
}

fn render_description(painter: &mut Painter, app: &App, sidebar_y: i32, index: usize) {
    let Some(line) = app.lines.get(&index).and_then(|l| l.as_match()) else {
        return;
    };
    let cols = app.cols as i32;
    let border_x = cols - SIDEBAR_WIDTH as i32;
    let start_y = sidebar_y + 1;
    let start_x = border_x + 2;
    let style = Style::default();

    let header = format!("Description for {} :", line.path);
    painter.addstr(start_y, start_x, &header, style);

    let line_prefix = "    * ";
    let available = (cols - start_x) as usize - line_prefix.len();
    let descriptors = [
        line.time_last_accessed(),
        line.time_last_modified(),
        line.owner_user(),
        line.owner_group(),
        line.file_size(),
        line.length_in_lines(),
    ];
    let mut y = start_y + 2;
    for descriptor in descriptors {
        let text = descriptor.unwrap_or_else(|_| "unavailable".to_string());
        let trimmed = trim_to_width(&text, available);
        painter.addstr(y, start_x, &format!("{line_prefix}{trimmed}"), style);
        y += 1;
    }
}

fn render_command_warning(painter: &mut Painter, app: &App) {
    let (min_x, min_y, _, max_y) = app.chrome_boundaries();
    let y = (max_y + min_y) as i32 / 2 - 3;
    let x = min_x as i32;
    let alert = Format::new(ansi::COLOR_WHITE, ansi::COLOR_RED, 0).style();
    painter.addstr(
        y,
        x,
        "Oh no! You already provided a command so you cannot enter command mode.",
        alert,
    );
    painter.addstr(
        y + 1,
        x,
        &format!(
            "The command you provided was \"{}\" ",
            app.options.preset_command
        ),
        Style::default(),
    );
    painter.addstr(
        y + 2,
        x,
        "Press any key to go back to selecting paths.",
        Style::default(),
    );
}

/// The centered command prompt with the chosen paths listed above it.
/// Returns the cursor position at the end of the typed input.
fn render_command_prompt(painter: &mut Painter, app: &App) -> Option<(u16, u16)> {
    let rows = app.rows as i32;
    let cols = app.cols as i32;
    let paths: Vec<String> = app
        .display_paths()
        .iter()
        .map(|line| line.path.clone())
        .collect();

    // aim the prompt at the middle of the screen; with a ton of paths that
    // would start printing off screen, so fall back to the bottom
    let mut begin_height = (rows as f64 / 2.0).round() as i32 - paths.len() as i32 / 2;
    if begin_height <= 1 {
        begin_height = rows - 6;
    }

    let border_line = "=".repeat(help_text::SHORT_COMMAND_PROMPT.len());
    let prompt_line = ".".repeat(help_text::SHORT_COMMAND_PROMPT.len());
    let max_path_length = if app.is_sidebar_mode() {
        // shorter so the paths stay out of the sidebar
        help_text::SHORT_COMMAND_PROMPT.len() + 18
    } else {
        (cols - 5).max(0) as usize
    };
    let style = Style::default();

    let start_height = begin_height - 1 - paths.len() as i32;
    painter.addstr(start_height - 3, 0, &border_line, style);
    painter.addstr(start_height - 2, 0, help_text::SHORT_PATHS_HEADER, style);
    painter.addstr(start_height - 1, 0, &border_line, style);
    for (index, path) in paths.iter().enumerate() {
        let trimmed: String = path.chars().take(max_path_length).collect();
        painter.addstr(start_height + index as i32, 0, &trimmed, style);
    }

    painter.addstr(begin_height, 0, help_text::SHORT_COMMAND_PROMPT, style);
    painter.addstr(begin_height + 1, 0, help_text::SHORT_COMMAND_PROMPT2, style);
    painter.addstr(begin_height - 1, 0, &border_line, style);
    painter.addstr(begin_height + 2, 0, &border_line, style);
    painter.addstr(begin_height + 3, 0, &prompt_line, style);
    painter.addstr(begin_height + 3, 0, &app.command_input, style);

    let prompt_row = begin_height + 3;
    if (0..rows).contains(&prompt_row) {
        let max_x = (cols as usize).saturating_sub(1);
        let x = app.command_input.chars().count().min(max_x) as u16;
        Some((x, prompt_row as u16))
    } else {
        None
    }
}

fn trim_to_width(text: &str, width: usize) -> String {
    let mut used = 0;
    let mut out = String::new();
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        used += w;
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::Runtime;
    use crate::input::line_map_from_lines;
    use crate::output::{EditorConfig, OutputScript};
    use crate::state::StateDir;
    use crate::tui::app::AppOptions;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn app_for(input: &[&str], size: (u16, u16)) -> (App, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let state = StateDir::at(dir.path());
        let runtime = Runtime::new("/repo");
        let lines: Vec<String> = input.iter().map(|s| s.to_string()).collect();
        let map = line_map_from_lines(&lines, false, false, &runtime);
        let output = OutputScript::new(state.clone(), "/bin/bash", EditorConfig::new("vim"));
        let app = App::new(
            map,
            AppOptions::default(),
            crate::keybindings::UserBindings::default(),
            output,
            state,
            size,
        );
        (app, dir)
    }

    fn draw(app: &mut App, size: (u16, u16)) -> Buffer {
        let backend = TestBackend::new(size.0, size.1);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();
        terminal.backend().buffer().clone()
    }

    fn row_text(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf.cell((x, y)).map(|c| c.symbol()).unwrap_or(" "))
            .collect()
    }

    fn screen_text(buf: &Buffer) -> String {
        (0..buf.area.height)
            .map(|y| row_text(buf, y))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn lines_render_in_input_order() {
        let (mut app, _dir) = app_for(&["first/file.py", "plain words", "second/file.py"], (80, 24));
        let buf = draw(&mut app, (80, 24));
        assert!(row_text(&buf, 0).contains("first/file.py"));
        assert!(row_text(&buf, 1).contains("plain words"));
        assert!(row_text(&buf, 2).contains("second/file.py"));
    }

    #[test]
    fn narrow_mode_shows_bottom_bar() {
        let (mut app, _dir) = app_for(&["first/file.py"], (80, 24));
        let buf = draw(&mut app, (80, 24));
        assert!(row_text(&buf, 22).starts_with("____"));
        assert!(row_text(&buf, 23).contains("[f|A] selection"));
    }

    #[test]
    fn selected_line_renders_arrow_decorator() {
        let (mut app, _dir) = app_for(&["first/file.py"], (80, 24));
        app.toggle_select();
        let buf = draw(&mut app, (80, 24));
        assert!(row_text(&buf, 0).contains("|===>first/file.py"));
    }

    #[test]
    fn scrollbar_appears_when_lines_overflow() {
        let input: Vec<String> = (0..40).map(|i| format!("src/f{i}.py")).collect();
        let input_refs: Vec<&str> = input.iter().map(|s| s.as_str()).collect();
        let (mut app, _dir) = app_for(&input_refs, (80, 24));
        assert!(app.scrollbar_activated());
        let buf = draw(&mut app, (80, 24));
        assert_eq!(&row_text(&buf, 0)[..3], "===");
        assert_eq!(&row_text(&buf, 23)[..3], "===");
        let screen = screen_text(&buf);
        assert!(screen.contains("/-\\"));
        assert!(screen.contains("\\-/"));
        // content shifts right of the scrollbar margin
        assert!(row_text(&buf, 0).contains("src/f0.py"));
        assert_eq!(&row_text(&buf, 1)[5..10], "src/f");
    }

    #[test]
    fn quick_select_mode_labels_rows() {
        let (mut app, _dir) = app_for(&["a/b.py", "c/d.py"], (80, 24));
        app.toggle_quick_select();
        let buf = draw(&mut app, (80, 24));
        assert_eq!(buf.cell((1, 0)).unwrap().symbol(), "A");
        assert_eq!(buf.cell((1, 1)).unwrap().symbol(), "B");
        // labelled rows indent the content past the margin
        assert!(row_text(&buf, 0).contains("a/b.py"));
    }

    #[test]
    fn wide_terminal_gets_sidebar_usage() {
        let (mut app, _dir) = app_for(&["a/b.py"], (220, 50));
        assert!(app.is_sidebar_mode());
        let buf = draw(&mut app, (220, 50));
        let screen = screen_text(&buf);
        assert!(screen.contains("[f] toggle the selection of a file"));
        // the vertical border column
        assert_eq!(buf.cell((220 - 50, 10)).unwrap().symbol(), "|");
    }

    #[test]
    fn command_mode_renders_prompt_and_paths() {
        let (mut app, _dir) = app_for(&["a/b.py"], (80, 24));
        app.handle_key(crossterm::event::KeyEvent::new(
            crossterm::event::KeyCode::Char('c'),
            crossterm::event::KeyModifiers::NONE,
        ))
        .unwrap();
        app.command_input.push_str("git add");
        let buf = draw(&mut app, (80, 24));
        let screen = screen_text(&buf);
        assert!(screen.contains(help_text::SHORT_COMMAND_PROMPT));
        assert!(screen.contains(help_text::SHORT_PATHS_HEADER));
        assert!(screen.contains("/repo/a/b.py"));
        assert!(screen.contains("git add"));
    }

    #[test]
    fn long_match_renders_center_truncated() {
        let long = "really/long/path/that/will/never/fit/on/a/tiny/terminal/file.py";
        let (mut app, _dir) = app_for(&[long], (30, 10));
        let buf = draw(&mut app, (30, 10));
        assert!(row_text(&buf, 0).contains("|...|"));
        let line = app.lines[&0].as_match().unwrap();
        assert!(line.truncated);
    }

    #[test]
    fn truncation_expands_back_on_resize() {
        let long = "really/long/path/that/will/never/fit/on/a/tiny/terminal/file.py";
        let (mut app, _dir) = app_for(&[long], (30, 10));
        draw(&mut app, (30, 10));
        assert!(app.lines[&0].as_match().unwrap().truncated);
        app.set_dimensions(120, 10);
        let buf = draw(&mut app, (120, 10));
        assert!(!app.lines[&0].as_match().unwrap().truncated);
        assert!(!row_text(&buf, 0).contains("|...|"));
    }

    #[test]
    fn painter_swallows_out_of_bounds_writes() {
        let mut buf = Buffer::empty(ratatui::layout::Rect::new(0, 0, 10, 4));
        let mut painter = Painter::new(&mut buf);
        painter.addstr(-1, 0, "x", Style::default());
        painter.addstr(10, 0, "x", Style::default());
        painter.addstr(0, -1, "x", Style::default());
        painter.addstr(0, 50, "x", Style::default());
        painter.addstr(2, 8, "overflowing", Style::default());
        assert_eq!(buf.cell((8, 2)).unwrap().symbol(), "o");
        assert_eq!(buf.cell((9, 2)).unwrap().symbol(), "v");
    }

    #[test]
    fn print_formatted_truncates_at_max_len() {
        let mut buf = Buffer::empty(ratatui::layout::Rect::new(0, 0, 20, 2));
        let mut painter = Painter::new(&mut buf);
        let text = FormattedText::parse("\x1b[31mabcdef\x1b[0mghij");
        print_formatted(&mut painter, 0, 0, &text, 8);
        let row: String = (0..20)
            .map(|x| buf.cell((x, 0)).map(|c| c.symbol()).unwrap_or(" "))
            .collect();
        assert!(row.starts_with("abcdefgh"));
        assert_eq!(row.trim_end().len(), 8);
    }
}

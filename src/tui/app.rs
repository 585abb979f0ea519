//! The screen controller: modes, hover and selection management, viewport
//! scrolling, dirty tracking, and dispatch.
//!
//! The controller owns the line map outright. Lines never reach back into
//! the controller; every flag mutation happens here, paired with the dirty
//! marking for that line's row.

use crate::keybindings::{Action, Keybindings, Mode, UserBindings};
use crate::line::MatchedLine;
use crate::output::OutputScript;
use crate::state::{LineMap, StateDir};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashSet;
use std::io;

pub const CHROME_MIN_X: u16 = 5;
pub const CHROME_MIN_Y: u16 = 0;
/// Width of the right-hand usage sidebar on wide terminals.
pub const SIDEBAR_WIDTH: u16 = 50;
/// Terminals wider than this get the sidebar layout.
pub const SIDEBAR_THRESHOLD: u16 = 200;

/// Quick-select labels, assigned to viewport rows top to bottom.
pub const LABELS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ1234567890~!@#$%^&*()_+<>?{}|;'";

/// How the pick pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickResult {
    /// `q`: selection persisted, "nothing to do" script written.
    Quit,
    /// A command or editor invocation was written to the script.
    Dispatched,
    /// Ctrl-C: leave without touching the state files.
    Interrupted,
}

/// Result of handling one key.
#[derive(Debug)]
pub enum ActionResult {
    Continue,
    Exit(PickResult),
}

/// Flags the controller needs from the command line.
#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    pub preset_command: String,
    pub all_input: bool,
    pub select_all: bool,
}

pub struct App {
    pub lines: LineMap,
    /// Line-map indexes of the Match lines, in display order. `hover_index`
    /// points into this.
    match_indexes: Vec<usize>,
    pub mode: Mode,
    pub hover_index: usize,
    /// Always <= 0; the on-screen row of line i is
    /// `chrome_min_y + i + scroll_offset`.
    pub scroll_offset: i32,
    pub dirty: bool,
    pub dirty_indexes: Vec<usize>,
    pub rows: u16,
    pub cols: u16,
    old_rows: u16,
    old_cols: u16,
    pub command_input: String,
    /// Set when the user tried to enter command mode with a preset command;
    /// the next key returns to select mode.
    pub show_command_warning: bool,
    /// Line-map index whose description pane is showing, if any.
    pub description_index: Option<usize>,
    pub options: AppOptions,
    keybindings: Keybindings,
    user_bindings: UserBindings,
    output: OutputScript,
    state: StateDir,
}

impl App {
    pub fn new(
        lines: LineMap,
        options: AppOptions,
        user_bindings: UserBindings,
        output: OutputScript,
        state: StateDir,
        size: (u16, u16),
    ) -> Self {
        let match_indexes: Vec<usize> = lines
            .values()
            .filter(|line| line.is_match())
            .map(|line| line.index())
            .collect();
        let (cols, rows) = size;

        let mut app = Self {
            lines,
            match_indexes,
            mode: Mode::Select,
            hover_index: 0,
            scroll_offset: 0,
            dirty: true,
            dirty_indexes: Vec::new(),
            rows,
            cols,
            old_rows: rows,
            old_cols: cols,
            command_input: String::new(),
            show_command_warning: false,
            description_index: None,
            options,
            keybindings: Keybindings::default(),
            user_bindings,
            output,
            state,
        };

        if app.options.select_all {
            app.toggle_select_all();
        }
        if !app.match_indexes.is_empty() {
            app.set_hover(0, true);
        }
        // the first real match may be far down the screen, so the offset
        // needs a valid value before the first paint
        app.update_scroll_offset();
        app.state.log_event("init");
        app
    }

    pub fn num_lines(&self) -> usize {
        self.lines.len()
    }

    pub fn num_matches(&self) -> usize {
        self.match_indexes.len()
    }

    pub fn match_indexes(&self) -> &[usize] {
        &self.match_indexes
    }

    pub fn hovered_line_index(&self) -> Option<usize> {
        self.match_indexes.get(self.hover_index).copied()
    }

    // --- geometry ---

    pub fn scrollbar_activated(&self) -> bool {
        self.num_lines() >= self.rows as usize
    }

    pub fn is_sidebar_mode(&self) -> bool {
        self.cols > SIDEBAR_THRESHOLD
    }

    /// Content area as (min_x, min_y, max_x, max_y): a left margin when the
    /// scrollbar or quick-select labels need the columns, four bottom rows
    /// for the bar in narrow mode, the sidebar width on wide terminals.
    pub fn chrome_boundaries(&self) -> (u16, u16, u16, u16) {
        let min_x = if self.scrollbar_activated() || self.mode == Mode::QuickSelect {
            CHROME_MIN_X
        } else {
            0
        };
        let (mut max_x, mut max_y) = (self.cols, self.rows);
        if self.is_sidebar_mode() {
            max_x = max_x.saturating_sub(SIDEBAR_WIDTH);
        } else {
            max_y = max_y.saturating_sub(4);
        }
        (min_x, CHROME_MIN_Y, max_x, max_y)
    }

    pub fn viewport_height(&self) -> usize {
        let (_, min_y, _, max_y) = self.chrome_boundaries();
        max_y.saturating_sub(min_y) as usize
    }

    /// Track the current terminal size, repainting on change.
    pub fn set_dimensions(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.rows = rows;
        if (cols, rows) != (self.old_cols, self.old_rows) {
            self.dirty_all();
            self.update_scroll_offset();
            self.state.log_event("resize");
        }
        self.old_cols = cols;
        self.old_rows = rows;
    }

    // --- dirty protocol ---

    pub fn dirty_all(&mut self) {
        self.dirty = true;
    }

    pub fn dirty_line(&mut self, line_index: usize) {
        self.dirty_indexes.push(line_index);
    }

    pub fn needs_draw(&self) -> bool {
        self.dirty || !self.dirty_indexes.is_empty()
    }

    pub fn reset_dirty(&mut self) {
        self.dirty = false;
        self.dirty_indexes.clear();
    }

    // --- hover & selection ---

    fn set_hover(&mut self, match_index: usize, value: bool) {
        let Some(&line_index) = self.match_indexes.get(match_index) else {
            return;
        };
        if let Some(line) = self.lines.get_mut(&line_index).and_then(|l| l.as_match_mut()) {
            line.hovered = value;
        }
        self.dirty_line(line_index);
    }

    pub fn toggle_select(&mut self) {
        let Some(&line_index) = self.match_indexes.get(self.hover_index) else {
            return;
        };
        if let Some(line) = self.lines.get_mut(&line_index).and_then(|l| l.as_match_mut()) {
            line.selected = !line.selected;
        }
        self.dirty_line(line_index);
    }

    /// Toggle every match, deduplicated by resolved path, so that two
    /// toggles return to the empty selection when paths are unique.
    pub fn toggle_select_all(&mut self) {
        let mut seen_paths = HashSet::new();
        for &line_index in &self.match_indexes {
            if let Some(line) = self.lines.get_mut(&line_index).and_then(|l| l.as_match_mut()) {
                if seen_paths.insert(line.path.clone()) {
                    line.selected = !line.selected;
                    self.dirty_indexes.push(line_index);
                }
            }
        }
    }

    pub fn move_index(&mut self, delta: i64) {
        let count = self.num_matches() as i64;
        if count == 0 {
            return;
        }
        let new_index = (self.hover_index as i64 + delta).rem_euclid(count) as usize;
        self.jump_to_index(new_index);
        self.description_index = None;
    }

    pub fn jump_to_index(&mut self, new_index: usize) {
        self.set_hover(self.hover_index, false);
        self.hover_index = new_index;
        self.set_hover(self.hover_index, true);
        self.update_scroll_offset();
    }

    pub fn page_down(&mut self) {
        let page = (self.viewport_height() / 2) as i64;
        self.move_index(page);
    }

    pub fn page_up(&mut self) {
        let page = (self.viewport_height() / 2) as i64;
        self.move_index(-page);
    }

    /// Center the viewport around the hovered line, with enough leeway that
    /// single-step hovers near the center don't reposition the view: the
    /// offset is only reassigned when it would move by more than a quarter
    /// viewport, or when the hover would land above the top row.
    pub fn update_scroll_offset(&mut self) {
        let Some(&hovered_line) = self.match_indexes.get(self.hover_index) else {
            return;
        };
        let window_height = self.viewport_height() as i32;
        let half_height = (window_height as f64 / 2.0).round() as i32;

        let screen_index = hovered_line as i32;
        let desired_top_row = (screen_index - half_height).max(0);

        let old_offset = self.scroll_offset;
        let new_offset = -desired_top_row;
        if (new_offset - old_offset).abs() > half_height / 2 || screen_index + old_offset < 0 {
            self.scroll_offset = new_offset;
        }
        if old_offset != self.scroll_offset {
            self.dirty_all();
        }
    }

    // --- key handling ---

    pub fn handle_key(&mut self, key: KeyEvent) -> io::Result<ActionResult> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Ok(ActionResult::Exit(PickResult::Interrupted));
        }

        if self.show_command_warning {
            // any key goes back to selecting paths
            self.show_command_warning = false;
            self.mode = Mode::Select;
            self.dirty_all();
            return Ok(ActionResult::Continue);
        }

        if self.mode == Mode::Command {
            return self.handle_command_key(key);
        }

        if let Some(action) = self.keybindings.dispatch(self.mode, key) {
            let result = self.execute_action(action)?;
            if matches!(result, ActionResult::Exit(_)) {
                return Ok(result);
            }
        } else if self.mode == Mode::QuickSelect {
            if let KeyCode::Char(c) = key.code {
                if LABELS.contains(c) {
                    self.select_label(c);
                }
            }
        }

        // user-bound keys dispatch their command immediately
        if let KeyCode::Char(c) = key.code {
            if let Some(command) = self.user_bindings.command_for(c).map(str::to_string) {
                return Ok(ActionResult::Exit(self.dispatch_command(&command)?));
            }
        }

        Ok(ActionResult::Continue)
    }

    fn execute_action(&mut self, action: Action) -> io::Result<ActionResult> {
        match action {
            Action::HoverUp => self.move_index(-1),
            Action::HoverDown => self.move_index(1),
            Action::PageUp => self.page_up(),
            Action::PageDown => self.page_down(),
            Action::JumpToStart => self.jump_to_index(0),
            Action::JumpToEnd => {
                if self.num_matches() > 0 {
                    self.jump_to_index(self.num_matches() - 1);
                }
            }
            Action::ToggleSelect => self.toggle_select(),
            Action::ToggleSelectAdvance => {
                self.toggle_select();
                self.move_index(1);
            }
            Action::ToggleSelectAll => self.toggle_select_all(),
            Action::Describe => self.describe_file(),
            Action::ToggleQuickSelect => self.toggle_quick_select(),
            Action::EnterCommandMode => self.begin_enter_command(),
            Action::Open => {
                // opening makes no sense in all-input mode without a preset
                // command to hand the lines to
                if !self.options.all_input || !self.options.preset_command.is_empty() {
                    return Ok(ActionResult::Exit(self.on_enter()?));
                }
            }
            Action::Quit => return Ok(ActionResult::Exit(self.quit()?)),
        }
        Ok(ActionResult::Continue)
    }

    fn handle_command_key(&mut self, key: KeyEvent) -> io::Result<ActionResult> {
        match key.code {
            KeyCode::Enter => {
                let command = self.command_input.clone();
                if command.is_empty() {
                    self.leave_command_mode();
                } else {
                    return Ok(ActionResult::Exit(self.dispatch_command(&command)?));
                }
            }
            KeyCode::Esc => self.leave_command_mode(),
            KeyCode::Backspace => {
                self.command_input.pop();
                self.dirty_all();
            }
            KeyCode::Char(c) => {
                self.command_input.push(c);
                self.dirty_all();
            }
            _ => {}
        }
        Ok(ActionResult::Continue)
    }

    fn leave_command_mode(&mut self) {
        self.mode = Mode::Select;
        self.command_input.clear();
        self.dirty_all();
        self.state.log_event("exit_command_mode");
    }

    pub fn describe_file(&mut self) {
        if self.is_sidebar_mode() {
            self.description_index = self.hovered_line_index();
            self.dirty_all();
        }
    }

    pub fn toggle_quick_select(&mut self) {
        self.mode = if self.mode == Mode::QuickSelect {
            Mode::Select
        } else {
            Mode::QuickSelect
        };
        self.dirty_all();
    }

    fn begin_enter_command(&mut self) {
        // entering command mode with a preset command already provided gets
        // a warning instead of a prompt
        if !self.options.preset_command.is_empty() {
            self.show_command_warning = true;
            self.dirty_all();
            return;
        }
        self.mode = Mode::Command;
        self.command_input.clear();
        self.dirty_all();
        self.state.log_event("enter_command_mode");
    }

    /// Quick-select: the label picks whichever line sits on that row, iff it
    /// is a match. Labels past the end of the line map are ignored.
    fn select_label(&mut self, label: char) {
        let Some(position) = LABELS.chars().position(|l| l == label) else {
            return;
        };
        let line_index = position as i64 - self.scroll_offset as i64;
        if line_index < 0 || line_index as usize >= self.num_lines() {
            return;
        }
        let line_index = line_index as usize;
        let Some(match_position) = self.match_indexes.iter().position(|&i| i == line_index) else {
            return;
        };
        self.jump_to_index(match_position);
        self.toggle_select();
    }

    // --- selection & dispatch ---

    /// The lines a dispatch operates on: the selected set when non-empty,
    /// otherwise the hovered line. Persists the selection for reuse on the
    /// next run over the same input.
    pub fn paths_to_use(&mut self) -> io::Result<Vec<usize>> {
        let mut indexes: Vec<usize> = self
            .match_indexes
            .iter()
            .copied()
            .filter(|i| {
                self.lines[i]
                    .as_match()
                    .is_some_and(|line| line.selected)
            })
            .collect();
        if indexes.is_empty() {
            if let Some(line_index) = self.hovered_line_index() {
                indexes.push(line_index);
            }
        }
        self.state.save_selection(&indexes)?;
        Ok(indexes)
    }

    /// Same as [`App::paths_to_use`] but without the selection write, for
    /// rendering the command prompt.
    pub fn display_paths(&self) -> Vec<&MatchedLine> {
        let selected: Vec<&MatchedLine> = self
            .match_indexes
            .iter()
            .filter_map(|i| self.lines[i].as_match())
            .filter(|line| line.selected)
            .collect();
        if !selected.is_empty() {
            return selected;
        }
        self.hovered_line_index()
            .and_then(|i| self.lines[&i].as_match())
            .into_iter()
            .collect()
    }

    fn matches_for(&self, indexes: &[usize]) -> Vec<&MatchedLine> {
        indexes
            .iter()
            .filter_map(|i| self.lines[i].as_match())
            .collect()
    }

    fn dispatch_command(&mut self, command: &str) -> io::Result<PickResult> {
        let indexes = self.paths_to_use()?;
        self.state
            .log_event(&format!("command_on_num_files {}", indexes.len()));
        let lines = self.matches_for(&indexes);
        self.output.exec_composed_command(command, &lines)?;
        Ok(PickResult::Dispatched)
    }

    fn on_enter(&mut self) -> io::Result<PickResult> {
        let indexes = self.paths_to_use()?;
        self.state
            .log_event(&format!("selected_num_files {}", indexes.len()));
        let lines = self.matches_for(&indexes);
        if self.options.preset_command.is_empty() {
            self.output.edit_files(&lines)?;
        } else {
            self.output
                .exec_composed_command(&self.options.preset_command, &lines)?;
        }
        Ok(PickResult::Dispatched)
    }

    fn quit(&mut self) -> io::Result<PickResult> {
        self.output.output_nothing()?;
        // persist the selection for reuse before exiting
        self.paths_to_use()?;
        Ok(PickResult::Quit)
    }
}

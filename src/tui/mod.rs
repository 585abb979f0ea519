//! The interactive pick pass.
//!
//! One blocking event loop: read a key (from `/dev/tty` when stdin is the
//! input pipe), let the controller process it, redraw if anything got dirty,
//! repeat until the controller reports an exit.

pub mod app;
pub mod help_text;
pub mod tty;
pub mod ui;

pub use app::{ActionResult, App, AppOptions, PickResult};

use color_eyre::Result;
use crossterm::ExecutableCommand;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::DefaultTerminal;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::collections::VecDeque;
use std::io::stdout;

/// Enter full-screen mode. Raw mode goes on the tty itself so piped stdin
/// keeps working.
pub fn enter_terminal() -> Result<DefaultTerminal> {
    tty::enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen).inspect_err(|_| {
        tty::disable_raw_mode().ok();
    })?;
    let backend = CrosstermBackend::new(stdout());
    let terminal = Terminal::new(backend).inspect_err(|_| {
        stdout().execute(LeaveAlternateScreen).ok();
        tty::disable_raw_mode().ok();
    })?;
    Ok(terminal)
}

/// Restore the terminal. Safe to call on any exit path.
pub fn leave_terminal() {
    let _ = stdout().execute(LeaveAlternateScreen);
    let _ = tty::disable_raw_mode();
}

/// Run the controller until it exits. `execute_keys` are fed to the
/// controller before any real keyboard input.
pub fn run(
    terminal: &mut DefaultTerminal,
    app: &mut App,
    execute_keys: &[String],
) -> Result<PickResult> {
    let mut pending: VecDeque<KeyEvent> = execute_keys
        .iter()
        .filter_map(|name| parse_execute_key(name))
        .collect();

    app.dirty_all();
    loop {
        let size = terminal.size()?;
        app.set_dimensions(size.width, size.height);

        if app.needs_draw() {
            terminal.draw(|frame| ui::render(frame, app))?;
            app.reset_dirty();
        }

        let key = match pending.pop_front() {
            Some(key) => key,
            None => match tty::read_event()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => key,
                Event::Resize(..) => {
                    app.dirty_all();
                    continue;
                }
                _ => continue,
            },
        };

        match app.handle_key(key)? {
            ActionResult::Continue => {}
            ActionResult::Exit(result) => return Ok(result),
        }
    }
}

/// Translate an `--execute-keys` name into a key event. Multi-character
/// names are the special keys; anything of length one is itself.
pub fn parse_execute_key(name: &str) -> Option<KeyEvent> {
    let code = match name {
        "UP" => KeyCode::Up,
        "DOWN" => KeyCode::Down,
        "PPAGE" | "PAGEUP" => KeyCode::PageUp,
        "NPAGE" | "PAGEDOWN" => KeyCode::PageDown,
        "HOME" => KeyCode::Home,
        "END" => KeyCode::End,
        "ENTER" => KeyCode::Enter,
        other => {
            let mut chars = other.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => KeyCode::Char(c),
                _ => return None,
            }
        }
    };
    Some(KeyEvent::new(code, KeyModifiers::NONE))
}

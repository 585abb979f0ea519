//! # fpp
//!
//! The PathPicker binary. Pipe terminal output in, pick paths in a
//! full-screen UI, and the selection lands in a shell script the wrapping
//! shell function sources:
//!
//! ```sh
//! git status | fpp
//! grep -rn TODO . | fpp
//! git branch | fpp -ai -c "git checkout"
//! ```
//!
//! The ingest pass runs when stdin is piped; the pick pass always runs,
//! reading keys from /dev/tty the way less and fzf do. State lives in
//! `~/.cache/fpp` (or `$FPP_DIR`) so re-running without piped input reuses
//! the previous lines and selection.

mod cli;

use clap::Parser;
use cli::Cli;
use color_eyre::Result;
use pathpicker::extract::Runtime;
use pathpicker::keybindings::UserBindings;
use pathpicker::output::{LOAD_SELECTION_WARNING, OutputScript};
use pathpicker::state::StateDir;
use pathpicker::tui::{self, App, AppOptions, PickResult, help_text};
use std::io::IsTerminal;

fn main() -> Result<()> {
    color_eyre::install()?;
    let flags = Cli::parse_from(cli::normalize_args(std::env::args()));

    let state = StateDir::from_env();
    if flags.clean {
        println!("Cleaning out state files...");
        let removed = state.clean()?;
        println!("Done! Removed {removed} files");
        return Ok(());
    }

    if flags.record {
        state.log_event("record_mode");
    }

    let script = OutputScript::from_env(state.clone());

    if std::io::stdin().is_terminal() {
        // no fresh input: reuse the previous line map when there is one.
        // --keep-open would otherwise carry a stale selection into every
        // reopen, so that gets dropped first.
        if flags.keep_open {
            state.clear_selection()?;
        }
        if state.lines_file().is_file() {
            println!("Using previous input piped to fpp...");
        } else {
            print_usage();
            return Ok(());
        }
    } else {
        let runtime = Runtime::from_env();
        let stdin = std::io::stdin();
        let lines = pathpicker::input::line_map_from_reader(
            stdin.lock(),
            !flags.disable_file_checks(),
            flags.all_input,
            &runtime,
        );
        state.log_event(&format!("total_num_files {}", lines.len()));
        state.save_lines(&lines)?;
        state.clear_selection()?;
    }

    loop {
        match run_pick_pass(&flags, &state, &script)? {
            PickResult::Interrupted => break,
            _ if !flags.keep_open => break,
            _ => continue,
        }
    }
    Ok(())
}

fn run_pick_pass(flags: &Cli, state: &StateDir, script: &OutputScript) -> Result<PickResult> {
    // the script is truncated at the start of every pick pass; everything
    // below appends to it
    script.clear()?;

    let mut lines = match state.load_lines() {
        Ok(lines) => lines,
        Err(_) => {
            script.append_error(LOAD_SELECTION_WARNING)?;
            script.append_exit()?;
            std::process::exit(1);
        }
    };

    // merge the previous selection back in, skipping anything that no
    // longer lines up with the map
    match state.load_selection() {
        Ok(Some(indexes)) => {
            for index in indexes {
                match lines.get_mut(&index).map(|line| line.as_match_mut()) {
                    Some(Some(matched)) => matched.selected = true,
                    Some(None) => script
                        .append_error(&format!("Line {index} was selected but is not a match"))?,
                    None => script
                        .append_error(&format!("Found index {index} more than total matches"))?,
                }
            }
        }
        Ok(None) => {}
        Err(_) => {
            script.append_error(LOAD_SELECTION_WARNING)?;
            script.append_exit()?;
            std::process::exit(1);
        }
    }

    if !lines.values().any(|line| line.is_match()) {
        script.output_no_lines_matched()?;
        std::process::exit(1);
    }

    let options = AppOptions {
        preset_command: flags.preset_command(),
        all_input: flags.all_input,
        select_all: flags.all,
    };
    let user_bindings = UserBindings::load(&state.keys_file());

    let mut terminal = tui::enter_terminal()?;
    let size = terminal
        .size()
        .map(|size| (size.width, size.height))
        .unwrap_or((80, 24));
    let mut app = App::new(
        lines,
        options,
        user_bindings,
        script.clone(),
        state.clone(),
        size,
    );
    let result = tui::run(&mut terminal, &mut app, &flags.execute_keys);
    tui::leave_terminal();
    result
}

fn print_usage() {
    eprintln!(
        "{}{}\n== Command Mode ==\n{}\nRun fpp --help for the command line arguments.",
        help_text::USAGE_INTRO,
        help_text::USAGE_PAGE,
        help_text::USAGE_COMMAND
    );
}

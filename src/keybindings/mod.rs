//! Keybinding dispatch for the picker.
//!
//! Built-in keys map to [`Action`]s through per-mode keybinds-rs
//! dispatchers. User-bound keys come from the `.fpp.keys` file in the state
//! directory and map a single character to a shell command that is
//! dispatched over the current selection.

mod action;
mod defaults;

pub use action::Action;

use crossterm::event::KeyEvent;
use keybinds::Keybinds;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// The three controller modes. Select and quick-select have their own
/// keybinding sets; command mode reads a line of text instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Mode {
    Select,
    QuickSelect,
    Command,
}

/// Built-in keybindings organized by mode.
#[derive(Debug)]
pub struct Keybindings {
    bindings: HashMap<Mode, Keybinds<Action>>,
}

impl Default for Keybindings {
    fn default() -> Self {
        defaults::default_keybindings()
    }
}

impl Keybindings {
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Get the action for a key event in the given mode.
    pub fn dispatch(&mut self, mode: Mode, event: KeyEvent) -> Option<Action> {
        self.bindings
            .get_mut(&mode)
            .and_then(|kb| kb.dispatch(event).copied())
    }

    pub fn bind(&mut self, mode: Mode, key: &str, action: Action) -> Result<(), keybinds::Error> {
        self.bindings.entry(mode).or_default().bind(key, action)
    }

    pub fn keys_for_action(&self, mode: Mode, action: Action) -> Vec<String> {
        self.bindings
            .get(&mode)
            .map(|kb| {
                kb.as_slice()
                    .iter()
                    .filter(|bind| bind.action == action)
                    .map(|bind| format_key_sequence(&bind.seq))
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn format_key_sequence(seq: &keybinds::KeySeq) -> String {
    seq.as_slice()
        .iter()
        .map(format_key_input)
        .collect::<Vec<_>>()
        .join(" ")
}

fn format_key_input(input: &keybinds::KeyInput) -> String {
    use keybinds::Key;
    let key = match input.key() {
        Key::Char(' ') => "Space".to_string(),
        Key::Char(c) => c.to_string(),
        Key::Enter => "Enter".to_string(),
        Key::Up => "Up".to_string(),
        Key::Down => "Down".to_string(),
        Key::PageUp => "PageUp".to_string(),
        Key::PageDown => "PageDown".to_string(),
        Key::Home => "Home".to_string(),
        Key::End => "End".to_string(),
        other => format!("{other:?}"),
    };
    if input.mods().contains(keybinds::Mods::CTRL) {
        format!("C-{key}")
    } else {
        key
    }
}

/// User key bindings from `.fpp.keys`: a `[bindings]` table mapping one
/// character to a shell command. A missing or unparsable file simply means
/// no bindings.
#[derive(Debug, Clone, Default)]
pub struct UserBindings {
    bindings: Vec<(char, String)>,
}

#[derive(Debug, Default, Deserialize)]
struct KeysFile {
    #[serde(default)]
    bindings: HashMap<String, String>,
}

impl UserBindings {
    pub fn load(path: &Path) -> Self {
        let Ok(contents) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Self {
        let file: KeysFile = toml::from_str(contents).unwrap_or_default();
        let mut bindings: Vec<(char, String)> = file
            .bindings
            .into_iter()
            .filter_map(|(key, command)| {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some((c, command)),
                    _ => None,
                }
            })
            .collect();
        bindings.sort_by_key(|(c, _)| *c);
        Self { bindings }
    }

    pub fn command_for(&self, key: char) -> Option<&str> {
        self.bindings
            .iter()
            .find(|(c, _)| *c == key)
            .map(|(_, command)| command.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (char, &str)> {
        self.bindings.iter().map(|(c, cmd)| (*c, cmd.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEventKind, KeyEventState, KeyModifiers};
    use strum::IntoEnumIterator;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn default_select_bindings_dispatch() {
        let mut kb = Keybindings::default();
        assert_eq!(
            kb.dispatch(Mode::Select, key(KeyCode::Char('j'))),
            Some(Action::HoverDown)
        );
        assert_eq!(
            kb.dispatch(Mode::Select, key(KeyCode::Char('k'))),
            Some(Action::HoverUp)
        );
        assert_eq!(
            kb.dispatch(Mode::Select, key(KeyCode::Enter)),
            Some(Action::Open)
        );
        assert_eq!(
            kb.dispatch(Mode::Select, key(KeyCode::Char('q'))),
            Some(Action::Quit)
        );
        assert_eq!(
            kb.dispatch(Mode::Select, key(KeyCode::End)),
            Some(Action::JumpToEnd)
        );
    }

    #[test]
    fn select_only_keys_are_unbound_in_quick_select() {
        let mut kb = Keybindings::default();
        assert_eq!(
            kb.dispatch(Mode::Select, key(KeyCode::Char('G'))),
            Some(Action::JumpToEnd)
        );
        assert_eq!(kb.dispatch(Mode::QuickSelect, key(KeyCode::Char('G'))), None);
        assert_eq!(
            kb.dispatch(Mode::Select, key(KeyCode::Char('A'))),
            Some(Action::ToggleSelectAll)
        );
        assert_eq!(kb.dispatch(Mode::QuickSelect, key(KeyCode::Char('A'))), None);
        // End still jumps even in quick-select
        assert_eq!(
            kb.dispatch(Mode::QuickSelect, key(KeyCode::End)),
            Some(Action::JumpToEnd)
        );
    }

    #[test]
    fn every_action_is_reachable_from_select_mode() {
        let kb = Keybindings::default();
        for action in Action::iter() {
            assert!(
                !kb.keys_for_action(Mode::Select, action).is_empty(),
                "action {action} has no select-mode binding"
            );
        }
    }

    #[test]
    fn user_bindings_parse_from_toml_table() {
        let bindings = UserBindings::parse(
            "[bindings]\nt = \"tail -f\"\nu = \"git add\"\n",
        );
        assert_eq!(bindings.command_for('t'), Some("tail -f"));
        assert_eq!(bindings.command_for('u'), Some("git add"));
        assert_eq!(bindings.command_for('z'), None);
    }

    #[test]
    fn user_bindings_ignore_multichar_keys() {
        let bindings = UserBindings::parse("[bindings]\nlong = \"nope\"\ns = \"yes\"\n");
        assert_eq!(bindings.command_for('s'), Some("yes"));
        assert!(bindings.command_for('l').is_none());
    }

    #[test]
    fn missing_or_invalid_file_means_no_bindings() {
        assert!(UserBindings::load(Path::new("/definitely/not/here")).is_empty());
        assert!(UserBindings::parse("this is [ not toml").is_empty());
    }
}

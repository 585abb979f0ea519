//! Default keybindings, using keybinds-rs key string syntax.

use super::{Action, Keybindings, Mode};

pub fn default_keybindings() -> Keybindings {
    let mut kb = Keybindings::new();
    add_select_mode(&mut kb);
    add_quick_select_mode(&mut kb);
    kb
}

/// Bind a key, panicking on invalid key syntax (only used for built-in
/// defaults).
fn bind(kb: &mut Keybindings, mode: Mode, key: &str, action: Action) {
    kb.bind(mode, key, action)
        .unwrap_or_else(|e| panic!("invalid default keybinding '{key}': {e}"));
}

fn add_select_mode(kb: &mut Keybindings) {
    use Action::*;
    use Mode::Select;

    bind(kb, Select, "k", HoverUp);
    bind(kb, Select, "Up", HoverUp);
    bind(kb, Select, "j", HoverDown);
    bind(kb, Select, "Down", HoverDown);
    bind(kb, Select, "Space", PageDown);
    bind(kb, Select, "PageDown", PageDown);
    bind(kb, Select, "b", PageUp);
    bind(kb, Select, "PageUp", PageUp);
    bind(kb, Select, "g", JumpToStart);
    bind(kb, Select, "Home", JumpToStart);
    bind(kb, Select, "G", JumpToEnd);
    bind(kb, Select, "End", JumpToEnd);

    bind(kb, Select, "f", ToggleSelect);
    bind(kb, Select, "F", ToggleSelectAdvance);
    bind(kb, Select, "A", ToggleSelectAll);

    bind(kb, Select, "d", Describe);
    bind(kb, Select, "x", ToggleQuickSelect);
    bind(kb, Select, "c", EnterCommandMode);
    bind(kb, Select, "Enter", Open);
    bind(kb, Select, "q", Quit);
}

fn add_quick_select_mode(kb: &mut Keybindings) {
    use Action::*;
    use Mode::QuickSelect;

    // `G` and `A` are label characters here, so only their non-character
    // forms survive; everything else matches select mode
    bind(kb, QuickSelect, "k", HoverUp);
    bind(kb, QuickSelect, "Up", HoverUp);
    bind(kb, QuickSelect, "j", HoverDown);
    bind(kb, QuickSelect, "Down", HoverDown);
    bind(kb, QuickSelect, "Space", PageDown);
    bind(kb, QuickSelect, "PageDown", PageDown);
    bind(kb, QuickSelect, "b", PageUp);
    bind(kb, QuickSelect, "PageUp", PageUp);
    bind(kb, QuickSelect, "g", JumpToStart);
    bind(kb, QuickSelect, "Home", JumpToStart);
    bind(kb, QuickSelect, "End", JumpToEnd);

    bind(kb, QuickSelect, "f", ToggleSelect);
    bind(kb, QuickSelect, "F", ToggleSelectAdvance);
    bind(kb, QuickSelect, "d", Describe);
    bind(kb, QuickSelect, "x", ToggleQuickSelect);
    bind(kb, QuickSelect, "c", EnterCommandMode);
    bind(kb, QuickSelect, "Enter", Open);
    bind(kb, QuickSelect, "q", Quit);
}

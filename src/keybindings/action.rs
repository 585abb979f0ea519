//! Built-in actions the controller can dispatch.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Everything a built-in key can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "PascalCase")]
#[strum(serialize_all = "PascalCase")]
pub enum Action {
    /// Move the hover up one match (wraps)
    HoverUp,
    /// Move the hover down one match (wraps)
    HoverDown,
    /// Move the hover up half a viewport
    PageUp,
    /// Move the hover down half a viewport
    PageDown,
    /// Jump to the first match
    JumpToStart,
    /// Jump to the last match
    JumpToEnd,
    /// Toggle selection of the hovered match
    ToggleSelect,
    /// Toggle selection, then move down one
    ToggleSelectAdvance,
    /// Toggle selection of all matches, deduplicated by resolved path
    ToggleSelectAll,
    /// Show the description pane for the hovered match (sidebar mode)
    Describe,
    /// Toggle quick-select mode
    ToggleQuickSelect,
    /// Enter command mode
    EnterCommandMode,
    /// Dispatch the selection to the editor or preset command
    Open,
    /// Persist the selection and quit
    Quit,
}

impl Action {
    /// Short description for the help chrome.
    pub fn description(&self) -> &'static str {
        match self {
            Action::HoverUp => "move upward by 1",
            Action::HoverDown => "move downward by 1",
            Action::PageUp => "page up",
            Action::PageDown => "page down",
            Action::JumpToStart => "jump to the first match",
            Action::JumpToEnd => "jump to the last match",
            Action::ToggleSelect => "toggle the selection of a file",
            Action::ToggleSelectAdvance => "toggle and move downward by 1",
            Action::ToggleSelectAll => "toggle selection of all (unique) files",
            Action::Describe => "describe file",
            Action::ToggleQuickSelect => "quick select mode",
            Action::EnterCommandMode => "command mode",
            Action::Open => "open selection",
            Action::Quit => "quit",
        }
    }
}

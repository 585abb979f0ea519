//! # pathpicker
//!
//! Select path-like tokens out of piped terminal output and hand them to
//! your editor or an arbitrary shell command.
//!
//! The pipeline has two phases sharing a state directory: the ingest pass
//! reads stdin, runs every line through the extraction waterfall, and
//! persists the resulting line map; the pick pass loads that map, restores
//! any previous selection, runs the full-screen selection UI, and emits a
//! shell script that the wrapping shell function sources.
//!
//! ## Example
//!
//! ```rust
//! use pathpicker::extract::{Runtime, match_line};
//!
//! let runtime = Runtime::new("/repo");
//! let result = match_line("modified: src/main.rs:42", false, false, &runtime).unwrap();
//! assert_eq!(result.path, "src/main.rs");
//! assert_eq!(result.num, 42);
//! ```

/// ANSI-formatted text: SGR parsing, slicing, and style conversion.
pub mod ansi;

/// The path-extraction waterfall and path resolution.
pub mod extract;

/// The ingest pass: stdin lines into the persisted line map.
pub mod input;

/// Built-in action dispatch and the user `.fpp.keys` bindings.
pub mod keybindings;

/// Simple and Match line variants.
pub mod line;

/// Output-script composition: editor commands, `$F` substitution, warnings.
pub mod output;

/// The state directory shared by both passes.
pub mod state;

/// The interactive TUI: controller, renderer, chrome.
pub mod tui;

// Re-export commonly used types for convenience
pub use ansi::FormattedText;
pub use extract::{MatchResult, Runtime};
pub use line::{Line, MatchedLine, SimpleLine};
pub use state::{LineMap, StateDir};
pub use tui::{App, AppOptions, PickResult};

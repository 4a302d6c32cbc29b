//! Output formatting for the CLI.

mod json;
mod text;

pub use json::JsonFormatter;
pub use text::TextFormatter;

use std::env;

/// True when ANSI colors should be written to stdout.
///
/// Disabled by `NO_COLOR`, by `TERM=dumb`, and when stdout is not a terminal.
pub fn colors_enabled(is_terminal: bool) -> bool {
    if env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty()) {
        return false;
    }
    if env::var("TERM").is_ok_and(|term| term.eq_ignore_ascii_case("dumb")) {
        return false;
    }
    is_terminal
}

/// Terminal width from `COLUMNS`, only when stdout is a terminal.
pub fn terminal_width(is_terminal: bool) -> Option<usize> {
    if !is_terminal {
        return None;
    }
    env::var("COLUMNS")
        .ok()
        .and_then(|cols| cols.trim().parse::<usize>().ok())
        .filter(|cols| *cols > 0)
}

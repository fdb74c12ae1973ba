//! Small shared helpers: colored message prefixes and color resolution.

use crate::config::ColorMode;
use owo_colors::OwoColorize;
use std::io::IsTerminal;

/// Whether stdout output should be colored.
pub fn stdout_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => std::io::stdout().is_terminal(),
    }
}

/// Whether stderr messages should be colored.
pub fn stderr_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => std::io::stderr().is_terminal(),
    }
}

pub fn error_prefix(color: bool) -> String {
    if color {
        "✖ error:".red().bold().to_string()
    } else {
        "✖ error:".to_string()
    }
}

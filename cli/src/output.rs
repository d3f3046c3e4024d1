//! Output formatting utilities for CLI commands

use colored::Colorize;

/// Print error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Dim the empty decoding so it stays visible in a terminal
pub fn decoded(joined: &str) -> String {
    if joined.is_empty() {
        "(none)".dimmed().to_string()
    } else {
        joined.to_string()
    }
}

/// Table header
pub fn header(text: &str) -> String {
    text.bold().to_string()
}

//! UI helpers for CLI display.

use console::{style, Color};

/// Check if color output is disabled via `NO_COLOR` env var.
#[must_use]
pub fn is_color_disabled() -> bool {
    std::env::var_os("NO_COLOR").is_some()
}

fn tagged(tag: &str, text: &str, color: Color) -> String {
    if is_color_disabled() {
        format!("[{tag}] {text}")
    } else {
        format!("{} {text}", style(format!("[{tag}]")).fg(color).bold())
    }
}

/// Print a styled header.
pub fn print_header(text: &str) {
    if is_color_disabled() {
        println!("=== {text} ===");
    } else {
        println!("{}", style(format!("=== {text} ===")).bold().cyan());
    }
}

/// Print a success message.
pub fn print_success(text: &str) {
    println!("{}", tagged("OK", text, Color::Green));
}

/// Print a warning to stderr.
pub fn print_warning(text: &str) {
    eprintln!("{}", tagged("WARN", text, Color::Yellow));
}

/// Print an error message to stderr.
pub fn print_error(text: &str) {
    eprintln!("{}", tagged("ERROR", text, Color::Red));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_always_present() {
        let line = tagged("WARN", "p3: no amplicons found", Color::Yellow);
        assert!(line.contains("WARN"));
        assert!(line.ends_with("p3: no amplicons found"));
    }

    #[test]
    fn print_functions_do_not_panic() {
        print_header("extract");
        print_success("");
        print_warning("p1: expected alignment is missing");
        print_error("Something went wrong");
    }
}

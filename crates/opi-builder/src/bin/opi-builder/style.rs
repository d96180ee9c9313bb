//! Terminal styling for command output.

use std::io::IsTerminal;

use owo_colors::{AnsiColors, OwoColorize};

fn paint(text: &str, color: AnsiColors, enabled: bool) -> String {
    if enabled {
        text.color(color).to_string()
    } else {
        text.to_string()
    }
}

/// Completion line on stdout.
pub fn success(text: impl AsRef<str>) -> String {
    paint(text.as_ref(), AnsiColors::Green, std::io::stdout().is_terminal())
}

/// Failure line; colored only when stderr is a terminal.
pub fn error(text: impl AsRef<str>) -> String {
    paint(text.as_ref(), AnsiColors::Red, std::io::stderr().is_terminal())
}

pub fn template_name(text: impl AsRef<str>) -> String {
    paint(text.as_ref(), AnsiColors::Cyan, std::io::stdout().is_terminal())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_when_disabled() {
        assert_eq!(paint("text_rw_group", AnsiColors::Cyan, false), "text_rw_group");
        let colored = paint("Wrote axis.opi", AnsiColors::Green, true);
        assert!(colored.contains("Wrote axis.opi"));
        assert_ne!(colored, "Wrote axis.opi");
    }
}

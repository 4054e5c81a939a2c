//! Terminal output.

use console::{style, Term};

use super::{Level, UserInterface};

/// Writes messages to the terminal.
///
/// Errors and warnings go to stderr, everything else to stdout. Messages
/// below `min_level` are dropped.
#[derive(Debug, Clone)]
pub struct BasicUI {
    min_level: Level,
    colors: bool,
}

impl BasicUI {
    pub fn new() -> Self {
        Self::with_level(Level::Info)
    }

    /// Only show messages at `min_level` or above.
    pub fn with_level(min_level: Level) -> Self {
        Self {
            min_level,
            colors: should_use_colors(),
        }
    }

    fn render(&self, level: Level, text: &str) -> String {
        if !self.colors {
            return text.to_string();
        }
        match level {
            Level::Detail => style(text).dim().to_string(),
            Level::Info => text.to_string(),
            Level::Success => style(text).green().to_string(),
            Level::Warn => style(text).yellow().to_string(),
            Level::Error => style(text).red().bold().to_string(),
        }
    }
}

impl Default for BasicUI {
    fn default() -> Self {
        Self::new()
    }
}

impl UserInterface for BasicUI {
    fn say(&self, level: Level, text: &str) {
        if level < self.min_level {
            return;
        }
        let line = self.render(level, text);
        let term = if level >= Level::Warn {
            Term::stderr()
        } else {
            Term::stdout()
        };
        // Nothing useful can be done when the terminal is gone
        let _ = term.write_line(&line);
    }
}

/// Whether to style output, honoring `NO_COLOR`.
pub fn should_use_colors() -> bool {
    std::env::var_os("NO_COLOR").is_none() && Term::stdout().is_term()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_without_colors_is_plain() {
        let ui = BasicUI {
            min_level: Level::Info,
            colors: false,
        };
        assert_eq!(ui.render(Level::Error, "boom"), "boom");
    }

    #[test]
    fn render_with_colors_keeps_text() {
        let ui = BasicUI {
            min_level: Level::Info,
            colors: true,
        };
        assert!(ui.render(Level::Success, "done").contains("done"));
    }
}

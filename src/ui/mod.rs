//! Output sinks.
//!
//! This module provides:
//! - [`UserInterface`] trait, the only way anything reaches the user
//! - [`SilentUI`], the default, which discards everything
//! - [`BasicUI`] for terminal output
//! - [`PrefixedUI`] which tags every message with a machine name
//! - [`MockUI`] which records messages for assertions
//!
//! # Example
//!
//! ```
//! use hangar::ui::{Level, MockUI, UserInterface};
//!
//! let ui = MockUI::new();
//! ui.info("Booting");
//! ui.say(Level::Warn, "Slow disk");
//! assert_eq!(ui.texts(), ["Booting", "Slow disk"]);
//! ```

pub mod mock;
pub mod prefixed;
pub mod terminal;

pub use mock::MockUI;
pub use prefixed::PrefixedUI;
pub use terminal::BasicUI;

use std::fmt;
use std::str::FromStr;

/// Severity of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Detail,
    Info,
    Success,
    Warn,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Detail => "detail",
            Self::Info => "info",
            Self::Success => "success",
            Self::Warn => "warn",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "detail" => Ok(Self::Detail),
            "info" => Ok(Self::Info),
            "success" => Ok(Self::Success),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(format!("unknown message level: {}", s)),
        }
    }
}

/// A sink for user-facing messages.
///
/// Shared between the environment, machines, and every pipeline run, so
/// implementations take `&self` and must be thread-safe.
pub trait UserInterface: Send + Sync {
    /// Deliver one message.
    fn say(&self, level: Level, text: &str);

    fn detail(&self, text: &str) {
        self.say(Level::Detail, text);
    }

    fn info(&self, text: &str) {
        self.say(Level::Info, text);
    }

    fn success(&self, text: &str) {
        self.say(Level::Success, text);
    }

    fn warn(&self, text: &str) {
        self.say(Level::Warn, text);
    }

    fn error(&self, text: &str) {
        self.say(Level::Error, text);
    }
}

/// Discards every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentUI;

impl UserInterface for SilentUI {
    fn say(&self, _level: Level, _text: &str) {}
}

//! Mock UI implementation for testing.
//!
//! `MockUI` implements the `UserInterface` trait and captures every
//! message for later assertion.

use std::sync::{Arc, Mutex};

use super::{Level, UserInterface};

/// Records messages instead of printing them.
///
/// Clones share the same buffer, so a test can hand one clone to an
/// environment and keep another for assertions.
#[derive(Debug, Clone, Default)]
pub struct MockUI {
    messages: Arc<Mutex<Vec<(Level, String)>>>,
}

impl MockUI {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every captured message, in order.
    pub fn messages(&self) -> Vec<(Level, String)> {
        self.lock().clone()
    }

    /// Captured message texts, in order.
    pub fn texts(&self) -> Vec<String> {
        self.lock().iter().map(|(_, text)| text.clone()).collect()
    }

    /// Captured texts at one level.
    pub fn at_level(&self, level: Level) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(Level, String)>> {
        // A panicking test thread must not hide what was captured
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl UserInterface for MockUI {
    fn say(&self, level: Level, text: &str) {
        self.lock().push((level, text.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_in_order() {
        let ui = MockUI::new();
        ui.info("one");
        ui.error("two");
        assert_eq!(
            ui.messages(),
            [(Level::Info, "one".to_string()), (Level::Error, "two".to_string())]
        );
    }

    #[test]
    fn clones_share_the_buffer() {
        let ui = MockUI::new();
        let handle = ui.clone();
        handle.warn("shared");
        assert_eq!(ui.at_level(Level::Warn), ["shared"]);
    }

    #[test]
    fn clear_empties_the_buffer() {
        let ui = MockUI::new();
        ui.info("x");
        ui.clear();
        assert!(ui.texts().is_empty());
    }
}

//! A UI wrapper that prefixes every message with a machine name.

use std::sync::Arc;

use super::{Level, UserInterface};

/// Prefixes each line of each message with `==> <name>: `.
#[derive(Clone)]
pub struct PrefixedUI {
    inner: Arc<dyn UserInterface>,
    prefix: String,
}

impl PrefixedUI {
    pub fn new(inner: Arc<dyn UserInterface>, name: &str) -> Self {
        Self {
            inner,
            prefix: format!("==> {}: ", name),
        }
    }
}

impl UserInterface for PrefixedUI {
    fn say(&self, level: Level, text: &str) {
        let prefixed = text
            .lines()
            .map(|line| format!("{}{}", self.prefix, line))
            .collect::<Vec<_>>()
            .join("\n");
        self.inner.say(level, &prefixed);
    }
}

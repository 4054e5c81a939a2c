//! General-purpose stages that providers compose into their pipelines.

use std::any::Any;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::action::context::keys;
use crate::action::{ActionContext, Next, Stage};
use crate::error::Result;
use crate::ui::{Level, UserInterface};

type Factory = Box<dyn Fn() -> Box<dyn Any + Send + Sync> + Send + Sync>;

/// Inserts fixed values into the context, then proceeds.
#[derive(Default)]
pub struct EnvSet {
    values: Vec<(String, Factory)>,
}

impl EnvSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to a fresh clone of `value` on every run.
    pub fn set<T>(mut self, key: impl Into<String>, value: T) -> Self
    where
        T: Clone + Any + Send + Sync,
    {
        let make: Factory = Box::new(move || -> Box<dyn Any + Send + Sync> {
            Box::new(value.clone())
        });
        self.values.push((key.into(), make));
        self
    }
}

impl Stage for EnvSet {
    fn name(&self) -> &str {
        "env_set"
    }

    fn call(&self, ctx: &mut ActionContext, next: Next<'_>) -> Result<()> {
        for (key, make) in &self.values {
            ctx.insert_boxed(key.clone(), make());
        }
        next.call(ctx)
    }
}

/// Sends a message to the run's UI, then proceeds.
///
/// Prefers the machine's prefixed UI when the run targets a machine.
pub struct Message {
    level: Level,
    text: String,
}

impl Message {
    pub fn new(level: Level, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(Level::Info, text)
    }
}

impl Stage for Message {
    fn name(&self) -> &str {
        "message"
    }

    fn call(&self, ctx: &mut ActionContext, next: Next<'_>) -> Result<()> {
        if let Some(machine) = ctx.machine() {
            machine.ui().say(self.level, &self.text);
        } else if let Some(ui) = ctx.ui() {
            ui.say(self.level, &self.text);
        }
        next.call(ctx)
    }
}

/// Measures how long the stages nested inside it take.
///
/// The duration is appended to `timings` in the context whether the
/// nested stages succeed or fail.
pub struct Timed {
    label: String,
}

impl Timed {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl Stage for Timed {
    fn name(&self) -> &str {
        &self.label
    }

    fn call(&self, ctx: &mut ActionContext, next: Next<'_>) -> Result<()> {
        let start = Instant::now();
        let result = next.call(ctx);
        let elapsed = start.elapsed();

        debug!("{} took {:?}", self.label, elapsed);
        match ctx.get_mut::<Vec<(String, Duration)>>(keys::TIMINGS) {
            Some(timings) => timings.push((self.label.clone(), elapsed)),
            None => ctx.insert(keys::TIMINGS, vec![(self.label.clone(), elapsed)]),
        }
        result
    }
}

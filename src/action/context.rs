//! Per-run state shared by the stages of a pipeline.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::environment::EnvironmentPaths;
use crate::machine::Machine;
use crate::ui::UserInterface;

/// Well-known context keys.
pub mod keys {
    /// `Arc<dyn UserInterface>`, seeded by the runner.
    pub const UI: &str = "ui";
    /// `Arc<EnvironmentPaths>`, seeded by the runner.
    ///
    /// Only the environment's paths travel with a run. Stages reach machines
    /// through [`MACHINE`] and anything else through values the caller
    /// passes in.
    pub const ENV: &str = "env";
    /// `Arc<Machine>`, set by [`Machine::action`](crate::machine::Machine::action).
    pub const MACHINE: &str = "machine";
    /// `Vec<(String, Duration)>`, appended to by the `Timed` stage.
    pub const TIMINGS: &str = "timings";
}

type Value = Box<dyn Any + Send + Sync>;

/// A typed key/value store built fresh for every pipeline run.
#[derive(Default)]
pub struct ActionContext {
    values: HashMap<String, Value>,
}

impl ActionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value, replacing whatever the key held.
    pub fn insert<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.values.insert(key.into(), Box::new(value));
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with<T: Any + Send + Sync>(mut self, key: impl Into<String>, value: T) -> Self {
        self.insert(key, value);
        self
    }

    pub(crate) fn insert_boxed(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    /// The value under `key`, if present and of type `T`.
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.values.get(key)?.downcast_ref()
    }

    pub fn get_mut<T: Any>(&mut self, key: &str) -> Option<&mut T> {
        self.values.get_mut(key)?.downcast_mut()
    }

    /// Remove and return the value under `key`.
    ///
    /// A value of a different type is left in place.
    pub fn remove<T: Any>(&mut self, key: &str) -> Option<T> {
        if !self.values.get(key)?.is::<T>() {
            return None;
        }
        let value = self.values.remove(key)?;
        value.downcast::<T>().ok().map(|boxed| *boxed)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.values.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Move every entry of `other` into this context; `other` wins on conflict.
    pub fn extend(&mut self, other: ActionContext) {
        self.values.extend(other.values);
    }

    /// The UI seeded by the runner.
    pub fn ui(&self) -> Option<Arc<dyn UserInterface>> {
        self.get::<Arc<dyn UserInterface>>(keys::UI).cloned()
    }

    /// Paths of the environment that started the run.
    pub fn env(&self) -> Option<&Arc<EnvironmentPaths>> {
        self.get(keys::ENV)
    }

    /// The machine the run targets, if any.
    pub fn machine(&self) -> Option<&Arc<Machine>> {
        self.get(keys::MACHINE)
    }

    /// Durations recorded by `Timed` stages, outermost last.
    pub fn timings(&self) -> &[(String, Duration)] {
        self.get::<Vec<(String, Duration)>>(keys::TIMINGS)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl fmt::Debug for ActionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionContext")
            .field("keys", &self.keys())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MockUI;

    #[test]
    fn insert_and_get_typed() {
        let mut ctx = ActionContext::new();
        ctx.insert("count", 3usize);
        assert_eq!(ctx.get::<usize>("count"), Some(&3));
        assert_eq!(ctx.get::<String>("count"), None);
        assert_eq!(ctx.get::<usize>("missing"), None);
    }

    #[test]
    fn get_mut_updates_in_place() {
        let mut ctx = ActionContext::new().with("log", vec!["a".to_string()]);
        ctx.get_mut::<Vec<String>>("log").unwrap().push("b".into());
        assert_eq!(ctx.get::<Vec<String>>("log").unwrap().len(), 2);
    }

    #[test]
    fn remove_with_wrong_type_keeps_value() {
        let mut ctx = ActionContext::new().with("n", 1u32);
        assert_eq!(ctx.remove::<String>("n"), None);
        assert!(ctx.contains("n"));
        assert_eq!(ctx.remove::<u32>("n"), Some(1));
        assert!(ctx.is_empty());
    }

    #[test]
    fn extend_lets_other_win() {
        let mut ctx = ActionContext::new().with("a", 1u8).with("b", 2u8);
        ctx.extend(ActionContext::new().with("b", 20u8).with("c", 30u8));
        assert_eq!(ctx.get::<u8>("a"), Some(&1));
        assert_eq!(ctx.get::<u8>("b"), Some(&20));
        assert_eq!(ctx.get::<u8>("c"), Some(&30));
        assert_eq!(ctx.keys(), ["a", "b", "c"]);
    }

    #[test]
    fn ui_accessor_returns_shared_handle() {
        let mock = MockUI::new();
        let ui: Arc<dyn UserInterface> = Arc::new(mock.clone());
        let ctx = ActionContext::new().with(keys::UI, ui);
        ctx.ui().unwrap().info("hello");
        assert_eq!(mock.texts(), ["hello"]);
    }

    #[test]
    fn timings_default_to_empty() {
        assert!(ActionContext::new().timings().is_empty());
    }

    #[test]
    fn debug_lists_keys() {
        let ctx = ActionContext::new().with("b", 1).with("a", 2);
        assert_eq!(format!("{:?}", ctx), r#"ActionContext { keys: ["a", "b"] }"#);
    }
}

//! Provider registry.
//!
//! Maps provider names to factories. The registry is built explicitly by
//! the host program and injected into the environment; there is no
//! process-wide registry.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::{Provider, ProviderContext};
use crate::error::{HangarError, Result};

/// Builds a provider instance for one machine.
pub type ProviderFactory =
    Arc<dyn Fn(&ProviderContext<'_>) -> Result<Box<dyn Provider>> + Send + Sync>;

/// Registry of available providers.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    factories: HashMap<String, ProviderFactory>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `name`.
    ///
    /// # Errors
    ///
    /// Returns `ProviderAlreadyRegistered` if the name is taken.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> Result<()>
    where
        F: Fn(&ProviderContext<'_>) -> Result<Box<dyn Provider>> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.factories.contains_key(&name) {
            return Err(HangarError::ProviderAlreadyRegistered { name });
        }
        debug!("Registered provider '{}'", name);
        self.factories.insert(name, Arc::new(factory));
        Ok(())
    }

    /// Builder form of [`register`](Self::register).
    pub fn with<F>(mut self, name: impl Into<String>, factory: F) -> Result<Self>
    where
        F: Fn(&ProviderContext<'_>) -> Result<Box<dyn Provider>> + Send + Sync + 'static,
    {
        self.register(name, factory)?;
        Ok(self)
    }

    pub fn lookup(&self, name: &str) -> Option<&ProviderFactory> {
        self.factories.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}

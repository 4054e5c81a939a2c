//! Virtualization backends.
//!
//! Every backend implements [`Provider`]. Backends are made available by
//! registering a factory in a [`ProviderRegistry`], which is handed to the
//! environment at construction.

pub mod registry;

pub use registry::{ProviderFactory, ProviderRegistry};

use std::fmt;
use std::path::Path;

use crate::action::Pipeline;
use crate::config::MachineConfig;

/// Everything a provider factory gets to see about the machine it backs.
#[derive(Debug, Clone, Copy)]
pub struct ProviderContext<'a> {
    pub machine_name: &'a str,
    pub provider_name: &'a str,
    pub config: &'a MachineConfig,
    /// Directory for the provider's own state for this machine
    pub data_dir: &'a Path,
}

impl ProviderContext<'_> {
    /// The `providers.<name>` section of the machine config.
    pub fn provider_config(&self) -> Option<&serde_yaml::Value> {
        self.config.provider_config(self.provider_name)
    }
}

/// A backend that realizes lifecycle operations for one machine.
pub trait Provider: Send + Sync {
    /// The pipeline for a named action (`up`, `halt`, `destroy`, ...), or
    /// `None` when the backend does not support it.
    fn action(&self, name: &str) -> Option<Pipeline>;

    /// Current state of the machine as the backend sees it.
    fn state(&self) -> MachineState {
        MachineState::unknown()
    }

    /// Connection details, once the machine is reachable.
    fn ssh_info(&self) -> Option<SshInfo> {
        None
    }
}

/// State reported by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineState {
    /// Machine-readable id, such as `running` or `not_created`
    pub id: String,
    /// One-line description for humans
    pub short_description: String,
}

impl MachineState {
    pub fn new(id: impl Into<String>, short_description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            short_description: short_description.into(),
        }
    }

    pub fn unknown() -> Self {
        Self::new("unknown", "the provider cannot determine the state")
    }

    pub fn not_created() -> Self {
        Self::new("not_created", "the machine has not been created")
    }
}

impl fmt::Display for MachineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.short_description)
    }
}

/// Where and how to reach a machine over SSH.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshInfo {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub private_key_path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bare;

    impl Provider for Bare {
        fn action(&self, _name: &str) -> Option<Pipeline> {
            None
        }
    }

    #[test]
    fn default_state_is_unknown() {
        assert_eq!(Bare.state().id, "unknown");
        assert!(Bare.ssh_info().is_none());
    }

    #[test]
    fn state_display_includes_description() {
        assert_eq!(
            MachineState::not_created().to_string(),
            "not_created (the machine has not been created)"
        );
    }

    #[test]
    fn provider_context_reads_own_section() {
        let config: MachineConfig =
            serde_yaml::from_str("providers:\n  docker:\n    image: ubuntu\n").unwrap();
        let ctx = ProviderContext {
            machine_name: "web",
            provider_name: "docker",
            config: &config,
            data_dir: Path::new("/tmp"),
        };
        assert_eq!(ctx.provider_config().unwrap()["image"], "ubuntu");
    }
}

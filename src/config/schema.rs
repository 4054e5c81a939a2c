//! Configuration schema definitions for Hangar.
//!
//! These structs describe the current (version 2) document format. Every
//! field is optional so that a single source can declare only the keys it
//! cares about; the built-in defaults fill in the rest during merging.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Schema version of the current document format.
pub const CURRENT_VERSION: u32 = 2;

/// Configuration for a single machine, and for the global scope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MachineConfig {
    /// Virtual machine settings
    pub vm: VmConfig,

    /// SSH connection settings
    pub ssh: SshConfig,

    /// Provider-specific settings, keyed by provider name
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub providers: BTreeMap<String, serde_yaml::Value>,
}

impl MachineConfig {
    /// Provider-specific settings for the named provider, if any.
    pub fn provider_config(&self, provider: &str) -> Option<&serde_yaml::Value> {
        self.providers.get(provider)
    }
}

/// The `vm` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VmConfig {
    /// Name of the box the machine is built from
    #[serde(rename = "box", skip_serializing_if = "Option::is_none")]
    pub box_name: Option<String>,

    /// Where the box can be downloaded from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_url: Option<String>,

    /// Default provider for machines that do not name one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_mac: Option<String>,

    /// Guest operating system family
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest: Option<String>,

    /// Boot with a visible console instead of headless
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gui: Option<bool>,

    /// Seconds to wait for the machine to boot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boot_timeout: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub networks: Option<Vec<Network>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub synced_folders: Option<Vec<SyncedFolder>>,
}

/// The `ssh` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SshConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Host-side port to connect to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Port sshd listens on inside the guest
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_port: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key_path: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub forward_agent: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub forward_x11: Option<bool>,

    /// Shell used for remote commands
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,

    /// Connection attempts before giving up
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_retries: Option<u32>,

    /// Seconds to wait per connection attempt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_timeout: Option<u64>,
}

/// Kind of a network declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkKind {
    ForwardedPort,
    PrivateNetwork,
    PublicNetwork,
}

/// A network attached to the machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Network {
    #[serde(rename = "type")]
    pub kind: NetworkKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Guest port (forwarded ports)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest: Option<u16>,

    /// Host port (forwarded ports)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,

    /// Static address (private and public networks)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,

    /// Host interface to bridge (public networks)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bridge: Option<String>,
}

impl Network {
    /// A forwarded port from `host` to `guest`.
    pub fn forwarded_port(guest: u16, host: u16) -> Self {
        Self {
            kind: NetworkKind::ForwardedPort,
            id: None,
            guest: Some(guest),
            host: Some(host),
            protocol: None,
            ip: None,
            bridge: None,
        }
    }
}

/// A host directory shared into the guest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncedFolder {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Host path, relative to the project root
    pub host: String,

    /// Absolute guest path
    pub guest: String,

    #[serde(default, skip_serializing_if = "is_false")]
    pub disabled: bool,
}

/// A `machines` entry in the project source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MachineDeclaration {
    pub name: String,

    #[serde(default, skip_serializing_if = "is_false")]
    pub primary: bool,

    /// Provider to use when none is requested explicitly
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    /// Whether `up` without arguments starts this machine
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub autostart: bool,

    /// Per-machine override block, merged last
    #[serde(default, skip_serializing_if = "is_null")]
    pub config: serde_yaml::Value,
}

fn default_true() -> bool {
    true
}

fn is_false(v: &bool) -> bool {
    !v
}

fn is_true(v: &bool) -> bool {
    *v
}

fn is_null(v: &serde_yaml::Value) -> bool {
    v.is_null()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn machine_config_parses_all_sections() {
        let config: MachineConfig = serde_yaml::from_str(
            r#"
vm:
  box: base
  hostname: web.local
  networks:
    - type: forwarded_port
      guest: 80
      host: 8080
ssh:
  port: 2222
providers:
  virtualbox:
    memory: 1024
"#,
        )
        .unwrap();

        assert_eq!(config.vm.box_name.as_deref(), Some("base"));
        assert_eq!(config.vm.hostname.as_deref(), Some("web.local"));
        assert_eq!(
            config.vm.networks.as_ref().unwrap()[0],
            Network::forwarded_port(80, 8080)
        );
        assert_eq!(config.ssh.port, Some(2222));
        assert_eq!(
            config.provider_config("virtualbox").unwrap()["memory"],
            1024
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result: std::result::Result<MachineConfig, _> =
            serde_yaml::from_str("vm:\n  bogus: true\n");
        assert!(result.is_err());

        let result: std::result::Result<MachineConfig, _> = serde_yaml::from_str("colour: red\n");
        assert!(result.is_err());
    }

    #[test]
    fn unset_fields_are_not_serialized() {
        let mut config = MachineConfig::default();
        config.ssh.port = Some(100);

        let value = serde_yaml::to_value(&config).unwrap();
        assert_eq!(value["ssh"]["port"], 100);
        assert!(value["ssh"].get("username").is_none());
        assert!(value["vm"].as_mapping().unwrap().is_empty());
        assert!(value.get("providers").is_none());
    }

    #[test]
    fn machine_declaration_defaults() {
        let decl: MachineDeclaration = serde_yaml::from_str("name: web").unwrap();
        assert_eq!(decl.name, "web");
        assert!(!decl.primary);
        assert!(decl.autostart);
        assert!(decl.provider.is_none());
        assert!(decl.config.is_null());
    }

    #[test]
    fn machine_declaration_requires_name() {
        let result: std::result::Result<MachineDeclaration, _> =
            serde_yaml::from_str("primary: true");
        assert!(result.is_err());
    }

    #[test]
    fn network_kind_uses_snake_case() {
        let net: Network = serde_yaml::from_str("type: private_network\nip: 10.0.0.2").unwrap();
        assert_eq!(net.kind, NetworkKind::PrivateNetwork);
        assert_eq!(net.ip.as_deref(), Some("10.0.0.2"));
    }
}

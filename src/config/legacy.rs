//! Version 1 config documents and their upgrade to the current schema.
//!
//! Legacy sources are parsed into [`LegacyConfig`] and translated by
//! [`upgrade_config`] before any merging happens, so the merger only ever
//! sees current-schema values.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use crate::config::schema::{
    MachineConfig, MachineDeclaration, Network, NetworkKind, SshConfig, SyncedFolder, VmConfig,
};

/// Schema version of legacy documents.
pub const LEGACY_VERSION: u32 = 1;

/// Provider that legacy `vm.customize` entries belong to.
const LEGACY_CUSTOMIZE_PROVIDER: &str = "virtualbox";

/// A version 1 config block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LegacyConfig {
    pub vm: LegacyVmConfig,
    pub ssh: LegacySshConfig,
}

/// The version 1 `vm` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LegacyVmConfig {
    #[serde(rename = "box")]
    pub box_name: Option<String>,
    pub box_url: Option<String>,
    pub base_mac: Option<String>,
    pub guest: Option<String>,
    pub host_name: Option<String>,
    pub boot_mode: Option<BootMode>,
    pub forward_ports: Option<Vec<LegacyForwardedPort>>,
    pub shared_folders: Option<BTreeMap<String, LegacySharedFolder>>,
    /// Raw VBoxManage argument lists
    pub customize: Option<Vec<Vec<String>>>,
    /// Multi-machine declarations
    pub define: Vec<LegacyMachine>,
}

/// The version 1 `ssh` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LegacySshConfig {
    pub username: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub guest_port: Option<u16>,
    pub private_key_path: Option<String>,
    pub forward_agent: Option<bool>,
    pub forward_x11: Option<bool>,
    pub shell: Option<String>,
    pub max_tries: Option<u32>,
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BootMode {
    Headless,
    Gui,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LegacyForwardedPort {
    #[serde(default)]
    pub name: Option<String>,
    pub guest: u16,
    pub host: u16,
    #[serde(default)]
    pub protocol: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LegacySharedFolder {
    pub host_path: String,
    pub guest_path: String,
    #[serde(default)]
    pub disabled: bool,
}

/// A `vm.define` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LegacyMachine {
    pub name: String,
    #[serde(default)]
    pub primary: bool,
    /// Per-machine block; it may not declare machines of its own
    #[serde(default, deserialize_with = "machine_block")]
    pub config: Option<LegacyConfig>,
}

fn machine_block<'de, D>(deserializer: D) -> Result<Option<LegacyConfig>, D::Error>
where
    D: Deserializer<'de>,
{
    let block = Option::<LegacyConfig>::deserialize(deserializer)?;
    if block.as_ref().is_some_and(|config| !config.vm.define.is_empty()) {
        return Err(serde::de::Error::custom(
            "vm.define is not allowed inside a machine's config",
        ));
    }
    Ok(block)
}

/// Translate a version 1 block into the current schema.
///
/// Returns the global config and the machine declarations that came from
/// `vm.define`, in declaration order.
pub fn upgrade_config(legacy: LegacyConfig) -> (MachineConfig, Vec<MachineDeclaration>) {
    let LegacyConfig { vm, ssh } = legacy;

    let mut providers = BTreeMap::new();
    if let Some(customize) = vm.customize {
        let mut vbox = serde_yaml::Mapping::new();
        vbox.insert(
            "customize".into(),
            serde_yaml::to_value(customize).unwrap_or_default(),
        );
        providers.insert(
            LEGACY_CUSTOMIZE_PROVIDER.to_string(),
            serde_yaml::Value::Mapping(vbox),
        );
    }

    let networks = vm.forward_ports.map(|ports| {
        ports
            .into_iter()
            .map(|port| Network {
                kind: NetworkKind::ForwardedPort,
                id: port.name,
                guest: Some(port.guest),
                host: Some(port.host),
                protocol: port.protocol,
                ip: None,
                bridge: None,
            })
            .collect()
    });

    let synced_folders = vm.shared_folders.map(|folders| {
        folders
            .into_iter()
            .map(|(name, folder)| SyncedFolder {
                id: Some(name),
                host: folder.host_path,
                guest: folder.guest_path,
                disabled: folder.disabled,
            })
            .collect()
    });

    let config = MachineConfig {
        vm: VmConfig {
            box_name: vm.box_name,
            box_url: vm.box_url,
            provider: None,
            hostname: vm.host_name,
            base_mac: vm.base_mac,
            guest: vm.guest,
            gui: vm.boot_mode.map(|mode| mode == BootMode::Gui),
            boot_timeout: None,
            networks,
            synced_folders,
        },
        ssh: SshConfig {
            username: ssh.username,
            host: ssh.host,
            port: ssh.port,
            guest_port: ssh.guest_port,
            private_key_path: ssh.private_key_path,
            forward_agent: ssh.forward_agent,
            forward_x11: ssh.forward_x11,
            shell: ssh.shell,
            connect_retries: ssh.max_tries,
            connect_timeout: ssh.timeout,
        },
        providers,
    };

    let machines = vm
        .define
        .into_iter()
        .map(|machine| {
            let config = match machine.config {
                Some(inner) => {
                    // Machine blocks carry no `define` list of their own.
                    let (upgraded, _) = upgrade_config(inner);
                    serde_yaml::to_value(upgraded).unwrap_or_default()
                }
                None => serde_yaml::Value::Null,
            };
            MachineDeclaration {
                name: machine.name,
                primary: machine.primary,
                provider: None,
                autostart: true,
                config,
            }
        })
        .collect();

    (config, machines)
}

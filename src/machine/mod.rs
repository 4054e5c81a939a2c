//! Resolved machines.
//!
//! A [`Machine`] pairs a name with a provider instance and the config folded
//! for that provider. Machines are built by the environment and handed out
//! as `Arc<Machine>`.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::action::{keys, ActionContext, ActionRunner};
use crate::boxes::BoxHandle;
use crate::config::MachineConfig;
use crate::error::{HangarError, Result};
use crate::provider::{MachineState, Provider, SshInfo};
use crate::ui::{PrefixedUI, UserInterface};

/// File under the machine's data directory holding the provider's id.
const ID_FILE: &str = "id";

/// Everything needed to assemble a [`Machine`].
pub struct MachineParts {
    pub name: String,
    pub provider_name: String,
    pub config: MachineConfig,
    pub provider: Box<dyn Provider>,
    pub box_handle: Option<BoxHandle>,
    pub data_dir: PathBuf,
    pub ui: Arc<dyn UserInterface>,
    pub runner: ActionRunner,
    pub default_private_key: PathBuf,
}

/// One machine of an environment, bound to one provider.
pub struct Machine {
    name: String,
    provider_name: String,
    config: MachineConfig,
    provider: Box<dyn Provider>,
    box_handle: Option<BoxHandle>,
    data_dir: PathBuf,
    ui: PrefixedUI,
    runner: ActionRunner,
    default_private_key: PathBuf,
}

impl Machine {
    pub fn new(parts: MachineParts) -> Self {
        let ui = PrefixedUI::new(parts.ui, &parts.name);
        Self {
            name: parts.name,
            provider_name: parts.provider_name,
            config: parts.config,
            provider: parts.provider,
            box_handle: parts.box_handle,
            data_dir: parts.data_dir,
            ui,
            runner: parts.runner,
            default_private_key: parts.default_private_key,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    /// The fully merged config for this machine and provider.
    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn provider(&self) -> &dyn Provider {
        self.provider.as_ref()
    }

    /// The box the machine is built from, if its config names one.
    pub fn box_handle(&self) -> Option<&BoxHandle> {
        self.box_handle.as_ref()
    }

    /// Directory for state the machine keeps between runs.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// UI whose messages are prefixed with the machine name.
    pub fn ui(&self) -> &PrefixedUI {
        &self.ui
    }

    /// Run the provider's pipeline for `name`.
    ///
    /// The machine is available to stages under `keys::MACHINE`.
    ///
    /// # Errors
    ///
    /// `UnimplementedProviderAction` if the provider has no such action;
    /// otherwise whatever the pipeline run returns.
    pub fn action(self: &Arc<Self>, name: &str, extra: ActionContext) -> Result<ActionContext> {
        let pipeline =
            self.provider
                .action(name)
                .ok_or_else(|| HangarError::UnimplementedProviderAction {
                    action: name.to_string(),
                    provider: self.provider_name.clone(),
                })?;

        info!("Running action '{}' on machine '{}'", name, self.name);
        let mut ctx = ActionContext::new().with(keys::MACHINE, Arc::clone(self));
        ctx.extend(extra);
        self.runner.run(&pipeline, ctx)
    }

    /// State as reported by the provider.
    pub fn state(&self) -> MachineState {
        self.provider.state()
    }

    /// Connection details for the machine.
    ///
    /// Starts from what the provider reports and applies the `ssh` config
    /// on top. The private key falls back to the environment's default
    /// key. `None` while the provider cannot reach the machine.
    pub fn ssh_info(&self) -> Option<SshInfo> {
        let reported = self.provider.ssh_info()?;
        let ssh = &self.config.ssh;

        Some(SshInfo {
            host: ssh.host.clone().unwrap_or(reported.host),
            port: ssh.port.unwrap_or(reported.port),
            username: ssh.username.clone().or(reported.username),
            private_key_path: ssh
                .private_key_path
                .clone()
                .or(reported.private_key_path)
                .or_else(|| Some(self.default_private_key.display().to_string())),
        })
    }

    /// The provider's id for this machine, if it has been created.
    pub fn id(&self) -> Result<Option<String>> {
        match fs::read_to_string(self.data_dir.join(ID_FILE)) {
            Ok(id) => {
                let id = id.trim();
                Ok((!id.is_empty()).then(|| id.to_string()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Persist the provider's id, or forget it with `None`.
    pub fn set_id(&self, id: Option<&str>) -> Result<()> {
        let path = self.data_dir.join(ID_FILE);
        match id {
            Some(id) => {
                fs::create_dir_all(&self.data_dir)?;
                fs::write(&path, id)?;
                debug!("Machine '{}' id set to {}", self.name, id);
            }
            None => match fs::remove_file(&path) {
                Ok(()) => debug!("Machine '{}' id cleared", self.name),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            },
        }
        Ok(())
    }
}

impl fmt::Debug for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("name", &self.name)
            .field("provider", &self.provider_name)
            .field("box", &self.box_handle.as_ref().map(|b| &b.name))
            .field("data_dir", &self.data_dir)
            .finish_non_exhaustive()
    }
}

//! Config command implementation.
//!
//! The `hangar config` command shows the resolved config of one machine.

use crate::cli::args::ConfigArgs;
use crate::environment::Environment;
use crate::error::{HangarError, Result};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// The config command implementation.
pub struct ConfigCommand<'a> {
    env: &'a Environment,
    args: ConfigArgs,
}

impl<'a> ConfigCommand<'a> {
    /// Create a new config command.
    pub fn new(env: &'a Environment, args: ConfigArgs) -> Self {
        Self { env, args }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &ConfigArgs {
        &self.args
    }
}

impl Command for ConfigCommand<'_> {
    fn execute(&self, ui: &dyn UserInterface) -> Result<CommandResult> {
        let name = match &self.args.name {
            Some(name) => name.clone(),
            None => match self.env.primary_machine_name()? {
                Some(name) => name,
                None => {
                    ui.error("No primary machine. Name one: hangar config <NAME>");
                    return Ok(CommandResult::failure(2));
                }
            },
        };
        let provider = match &self.args.provider {
            Some(provider) => provider.clone(),
            None => match self.env.config()?.definition(&name).and_then(|d| d.provider.clone()) {
                Some(provider) => provider,
                None => self.env.default_provider()?,
            },
        };

        let config = match self.env.machine_config(&name, &provider) {
            Ok((config, _)) => config,
            Err(HangarError::BoxNotFound { name: box_name, provider }) => {
                ui.warn(&format!(
                    "Box '{}' is not installed for provider '{}'; showing config without it",
                    box_name, provider
                ));
                self.env.config()?.machine_config(&name, None)?
            }
            Err(e) => return Err(e),
        };

        // Show the sources that went into it
        for origin in self.env.config()?.origins() {
            ui.detail(&format!("# {}", origin.display()));
        }

        let rendered = if self.args.json {
            serde_json::to_string_pretty(&config).map_err(|e| HangarError::Other(e.into()))?
        } else {
            serde_yaml::to_string(&config).map_err(|e| HangarError::Other(e.into()))?
        };
        ui.info(rendered.trim_end());

        Ok(CommandResult::success())
    }
}

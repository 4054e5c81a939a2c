//! Machines command implementation.
//!
//! The `hangar machines` command lists the machines the project declares.

use crate::cli::args::MachinesArgs;
use crate::environment::Environment;
use crate::error::Result;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// The machines command implementation.
pub struct MachinesCommand<'a> {
    env: &'a Environment,
    args: MachinesArgs,
}

impl<'a> MachinesCommand<'a> {
    pub fn new(env: &'a Environment, args: MachinesArgs) -> Self {
        Self { env, args }
    }
}

impl Command for MachinesCommand<'_> {
    fn execute(&self, ui: &dyn UserInterface) -> Result<CommandResult> {
        let primary = self.env.primary_machine_name()?;
        let active = if self.args.active {
            self.env.active_machines()?
        } else {
            Vec::new()
        };

        let definitions = self.env.config()?.definitions();
        // A lone machine is trivially primary
        let mark_primary = definitions.len() > 1;

        for definition in definitions {
            let name = &definition.name;
            let mut line = name.clone();
            if mark_primary && primary.as_ref() == Some(name) {
                line.push_str(" (primary)");
            }
            if !definition.autostart {
                line.push_str(" (manual start)");
            }
            let providers: Vec<&str> = active
                .iter()
                .filter(|(machine, _)| machine == name)
                .map(|(_, provider)| provider.as_str())
                .collect();
            if !providers.is_empty() {
                line.push_str(&format!(" [created: {}]", providers.join(", ")));
            }
            ui.info(&line);
        }

        Ok(CommandResult::success())
    }
}

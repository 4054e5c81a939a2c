//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::args::{Cli, Commands, MachinesArgs};
use crate::environment::{Environment, EnvironmentOptions};
use crate::error::Result;
use crate::ui::UserInterface;

/// Trait for command implementations.
pub trait Command {
    /// Execute the command, reporting through `ui`.
    fn execute(&self, ui: &dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }
}

/// Dispatches CLI commands to their implementations.
#[derive(Debug, Clone, Default)]
pub struct CommandDispatcher {
    cwd: Option<PathBuf>,
    home: Option<PathBuf>,
    file: Option<String>,
}

impl CommandDispatcher {
    /// Create a dispatcher from the global flags.
    pub fn new(cli: &Cli) -> Self {
        Self {
            cwd: cli.cwd.clone(),
            home: cli.home.clone(),
            file: cli.file.clone(),
        }
    }

    /// Build the environment the global flags describe.
    ///
    /// The binary registers no providers; commands only inspect config.
    pub fn environment(&self, ui: Arc<dyn UserInterface>) -> Result<Environment> {
        let mut options = EnvironmentOptions::new().ui(ui);
        options.cwd = self.cwd.clone();
        options.home_path = self.home.clone();
        options.project_file_name = self.file.clone();
        Environment::new(options)
    }

    /// Dispatch and execute a command.
    ///
    /// Without a subcommand, lists machines.
    pub fn dispatch(&self, cli: &Cli, ui: Arc<dyn UserInterface>) -> Result<CommandResult> {
        match &cli.command {
            Some(Commands::Completions(args)) => {
                super::completions::CompletionsCommand::new(args.clone()).execute(ui.as_ref())
            }
            Some(Commands::Machines(args)) => {
                let env = self.environment(Arc::clone(&ui))?;
                super::machines::MachinesCommand::new(&env, args.clone()).execute(ui.as_ref())
            }
            Some(Commands::Config(args)) => {
                let env = self.environment(Arc::clone(&ui))?;
                super::config::ConfigCommand::new(&env, args.clone()).execute(ui.as_ref())
            }
            Some(Commands::Boxes(_)) => {
                let env = self.environment(Arc::clone(&ui))?;
                super::boxes::BoxesCommand::new(&env).execute(ui.as_ref())
            }
            None => {
                let env = self.environment(Arc::clone(&ui))?;
                super::machines::MachinesCommand::new(&env, MachinesArgs::default())
                    .execute(ui.as_ref())
            }
        }
    }
}

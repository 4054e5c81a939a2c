//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Hangar - Reproducible development environments.
#[derive(Debug, Parser)]
#[command(name = "hangar")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Working directory (overrides the current directory)
    #[arg(long, global = true, env = "HANGAR_CWD")]
    pub cwd: Option<PathBuf>,

    /// Home directory (defaults to ~/.hangar)
    #[arg(long, global = true, env = "HANGAR_HOME")]
    pub home: Option<PathBuf>,

    /// Name of the project config file (defaults to Hangarfile)
    #[arg(short, long, global = true, env = "HANGAR_PROJECT_FILE")]
    pub file: Option<String>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List machines in declaration order (default if no command specified)
    Machines(MachinesArgs),

    /// Show the resolved config of a machine
    Config(ConfigArgs),

    /// List installed boxes
    Boxes(BoxesArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `machines` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct MachinesArgs {
    /// Also show machines that have been created, with their provider
    #[arg(long)]
    pub active: bool,
}

/// Arguments for the `config` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ConfigArgs {
    /// Machine to show (defaults to the primary machine)
    pub name: Option<String>,

    /// Provider to resolve the config for
    #[arg(short, long, env = "HANGAR_DEFAULT_PROVIDER")]
    pub provider: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `boxes` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct BoxesArgs {}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

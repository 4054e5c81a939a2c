//! Command-line interface for Hangar.
//!
//! This module provides the CLI argument parsing using clap's derive macros
//! and command implementations.
//!
//! # Architecture
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`commands`] - Command implementations

pub mod args;
pub mod commands;

pub use args::{BoxesArgs, Cli, Commands, CompletionsArgs, ConfigArgs, MachinesArgs};
pub use commands::{Command, CommandDispatcher, CommandResult};

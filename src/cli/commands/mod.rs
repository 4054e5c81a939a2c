//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! Commands are dispatched via [`CommandDispatcher`], which builds the
//! [`Environment`](crate::environment::Environment) from the global flags
//! and routes CLI subcommands to their implementations.

pub mod boxes;
pub mod completions;
pub mod config;
pub mod dispatcher;
pub mod machines;

pub use dispatcher::{Command, CommandDispatcher, CommandResult};

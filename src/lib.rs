//! Hangar - Reproducible development environments.
//!
//! Hangar assembles machine configuration from layered YAML sources and runs
//! every lifecycle operation through a pipeline of stages, whatever the
//! virtualization backend.
//!
//! # Modules
//!
//! - [`action`] - Stages, pipelines, and the runner that executes them
//! - [`boxes`] - Installed box lookup
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Config loading, legacy upgrade, merging, and machine discovery
//! - [`environment`] - The orchestrator: paths, home setup, machine cache
//! - [`error`] - Error types and result aliases
//! - [`machine`] - Resolved machines
//! - [`provider`] - Backend trait and registry
//! - [`ui`] - Output sinks
//!
//! # Example
//!
//! ```
//! use hangar::config::{parse_layer, LayerKind, LoadedConfig};
//! use std::path::Path;
//!
//! let source = "machines:\n  - name: web\n  - name: db\n    primary: true\n";
//! let layer = parse_layer(source, Path::new("Hangarfile"), LayerKind::Project).unwrap();
//! let loaded = LoadedConfig::from_layers(vec![layer]).unwrap();
//!
//! assert_eq!(loaded.machine_names(), ["web", "db"]);
//! assert_eq!(loaded.primary().map(|m| m.name.as_str()), Some("db"));
//! ```
//!
//! For environments on disk, see the integration tests.

pub mod action;
mod assets;
pub mod boxes;
pub mod cli;
pub mod config;
pub mod environment;
pub mod error;
pub mod machine;
pub mod provider;
pub mod ui;

pub use error::{HangarError, Result};

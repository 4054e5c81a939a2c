//! Configuration loading, parsing, merging, and machine discovery.
//!
//! This module handles all aspects of configuration:
//! - Schema definitions in [`schema`]
//! - Legacy (version 1) documents and their upgrade in [`legacy`]
//! - Source discovery and loading in [`loader`]
//! - Deep merging in [`merger`]
//! - Machine definitions and primary resolution in [`machines`]
//!
//! # Example
//!
//! ```
//! use hangar::config::{load_config, ConfigSources};
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let home = TempDir::new().unwrap();
//! let project = TempDir::new().unwrap();
//! fs::write(
//!     project.path().join("Hangarfile"),
//!     "machines:\n  - name: web\n  - name: db\n    primary: true\n",
//! )
//! .unwrap();
//!
//! let sources = ConfigSources::discover(home.path(), Some(project.path()), "Hangarfile");
//! let config = load_config(&sources).unwrap();
//! assert_eq!(config.machine_names(), ["web", "db"]);
//! assert_eq!(config.primary().unwrap().name, "db");
//! ```

pub mod legacy;
pub mod loader;
pub mod machines;
pub mod merger;
pub mod schema;

// Schema re-exports
pub use schema::{
    MachineConfig, MachineDeclaration, Network, NetworkKind, SshConfig, SyncedFolder, VmConfig,
    CURRENT_VERSION,
};

// Legacy re-exports
pub use legacy::{upgrade_config, LegacyConfig, LEGACY_VERSION};

// Loader re-exports
pub use loader::{
    find_root_path, load_config, load_layer, parse_layer, system_layer, ConfigLayer,
    ConfigSources, Document, LayerKind, LoadedConfig, VersionedDocument, DEFAULT_PROJECT_FILE,
};

// Merger re-exports
pub use merger::{deep_merge, merge_layers, strip_nulls};

// Machine re-exports
pub use machines::{discover_machines, resolve_primary, MachineDefinition, DEFAULT_MACHINE_NAME};

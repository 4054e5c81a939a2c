//! Config source discovery, parsing, and loading.
//!
//! Sources are merged lowest precedence first:
//! 1. Built-in defaults (embedded `defaults.yml`)
//! 2. Home source (`~/.hangar/Hangarfile`)
//! 3. Project source (`Hangarfile`, found by walking up from the cwd)
//! 4. Box source (the `Hangarfile` shipped inside a box), per machine
//! 5. The machine's own `config` block in the project source

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};
use tracing::{debug, trace};

use crate::assets;
use crate::config::legacy::{upgrade_config, LegacyConfig, LEGACY_VERSION};
use crate::config::machines::{discover_machines, resolve_primary, MachineDefinition};
use crate::config::merger::{merge_layers, strip_nulls};
use crate::config::schema::{MachineConfig, MachineDeclaration, CURRENT_VERSION};
use crate::error::{HangarError, Result};

/// Default file name of the project, home, and box sources.
pub const DEFAULT_PROJECT_FILE: &str = "Hangarfile";

/// Where a layer came from; also its precedence, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LayerKind {
    System,
    Home,
    Project,
    Box,
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::Home => write!(f, "home"),
            Self::Project => write!(f, "project"),
            Self::Box => write!(f, "box"),
        }
    }
}

/// A current-schema document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// The `vm`, `ssh`, and `providers` sections, already schema-checked
    pub config: Value,
    /// The `machines` list, in declaration order
    pub machines: Vec<MachineDeclaration>,
}

/// A parsed source, tagged with its schema version.
#[derive(Debug, Clone, PartialEq)]
pub enum VersionedDocument {
    V1(LegacyConfig),
    V2(Document),
}

impl VersionedDocument {
    pub fn version(&self) -> u32 {
        match self {
            Self::V1(_) => LEGACY_VERSION,
            Self::V2(_) => CURRENT_VERSION,
        }
    }

    /// Bring the document to the current schema.
    pub fn upgrade(self) -> Result<Document> {
        match self {
            Self::V2(doc) => Ok(doc),
            Self::V1(legacy) => {
                let (config, machines) = upgrade_config(legacy);
                let config = serde_yaml::to_value(config)
                    .map_err(|e| HangarError::Other(anyhow::anyhow!(e)))?;
                Ok(Document { config, machines })
            }
        }
    }
}

/// One loaded config source.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigLayer {
    pub kind: LayerKind,
    pub origin: PathBuf,
    pub document: VersionedDocument,
}

impl ConfigLayer {
    /// Schema version the source was written in.
    pub fn version(&self) -> u32 {
        self.document.version()
    }

    /// The layer as a current-schema document.
    ///
    /// Only the project layer may declare machines.
    pub fn into_document(self) -> Result<Document> {
        let doc = self.document.upgrade()?;
        if self.kind != LayerKind::Project && !doc.machines.is_empty() {
            return Err(HangarError::ConfigInvalid {
                path: self.origin,
                message: format!("machines cannot be declared in the {} source", self.kind),
            });
        }
        Ok(doc)
    }
}

/// Parse one source into a layer, validating it against its schema.
///
/// A source without a `version` key is read as the current schema.
pub fn parse_layer(content: &str, origin: &Path, kind: LayerKind) -> Result<ConfigLayer> {
    let invalid = |message: String| HangarError::ConfigInvalid {
        path: origin.to_path_buf(),
        message,
    };

    let raw: Value = serde_yaml::from_str(content).map_err(|e| invalid(e.to_string()))?;
    let mut map = match raw {
        Value::Null => Mapping::new(),
        Value::Mapping(map) => map,
        _ => return Err(invalid("top level must be a mapping".to_string())),
    };

    let version = match map.remove("version") {
        None | Some(Value::Null) => CURRENT_VERSION,
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| invalid(format!("invalid version {}", n)))?,
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map_err(|_| invalid(format!("invalid version '{}'", s)))?,
        Some(other) => return Err(invalid(format!("invalid version {:?}", other))),
    };

    let document = match version {
        LEGACY_VERSION => {
            let legacy: LegacyConfig = serde_yaml::from_value(strip_nulls(&Value::Mapping(map)))
                .map_err(|e| invalid(e.to_string()))?;
            VersionedDocument::V1(legacy)
        }
        CURRENT_VERSION => {
            let machines: Vec<MachineDeclaration> = match map.remove("machines") {
                None | Some(Value::Null) => Vec::new(),
                Some(value) => serde_yaml::from_value(value)
                    .map_err(|e| invalid(format!("machines: {}", e)))?,
            };
            for machine in &machines {
                check_schema(&machine.config)
                    .map_err(|e| invalid(format!("machine '{}': {}", machine.name, e)))?;
            }

            let config = Value::Mapping(map);
            check_schema(&config).map_err(|e| invalid(e.to_string()))?;
            VersionedDocument::V2(Document { config, machines })
        }
        other => return Err(invalid(format!("unsupported config version {}", other))),
    };

    Ok(ConfigLayer {
        kind,
        origin: origin.to_path_buf(),
        document,
    })
}

/// Read and parse one source from disk.
pub fn load_layer(path: &Path, kind: LayerKind) -> Result<ConfigLayer> {
    debug!("Loading {} config from {}", kind, path.display());
    let content = fs::read_to_string(path)?;
    parse_layer(&content, path, kind)
}

/// The built-in defaults layer.
pub fn system_layer() -> Result<ConfigLayer> {
    parse_layer(
        assets::defaults()?,
        Path::new(assets::DEFAULTS_FILE),
        LayerKind::System,
    )
}

fn check_schema(config: &Value) -> std::result::Result<MachineConfig, serde_yaml::Error> {
    match config {
        Value::Null => Ok(MachineConfig::default()),
        other => serde_yaml::from_value(strip_nulls(other)),
    }
}

/// Find the project root by walking up from `start`.
///
/// The root is the first directory that contains `file_name`.
pub fn find_root_path(start: &Path, file_name: &str) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        if current.join(file_name).is_file() {
            return Some(current);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Paths of the on-disk sources for an environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    pub home: Option<PathBuf>,
    pub project: Option<PathBuf>,
}

impl ConfigSources {
    /// Locate the home and project sources.
    pub fn discover(home_path: &Path, root_path: Option<&Path>, file_name: &str) -> Self {
        let home = home_path.join(file_name);
        Self {
            home: home.is_file().then_some(home),
            project: root_path.map(|root| root.join(file_name)),
        }
    }
}

/// Configuration loaded for an environment.
///
/// Holds the merged global tree (defaults, home, project) and the machine
/// definitions. Per-machine configs are folded on demand because the box
/// layer depends on which provider is asked for.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    global_value: Value,
    global: MachineConfig,
    definitions: Vec<MachineDefinition>,
    origins: Vec<PathBuf>,
}

impl LoadedConfig {
    /// Merge an ordered list of layers.
    ///
    /// Layers must be sorted by precedence and must not include a box layer.
    pub fn from_layers(layers: Vec<ConfigLayer>) -> Result<Self> {
        let mut origins = Vec::with_capacity(layers.len());
        let mut values = Vec::with_capacity(layers.len());
        let mut declarations = Vec::new();
        let mut project_origin = None;

        for layer in layers {
            trace!(
                "Merging {} layer {} (version {})",
                layer.kind,
                layer.origin.display(),
                layer.version()
            );
            origins.push(layer.origin.clone());
            if layer.kind == LayerKind::Project {
                project_origin = Some(layer.origin.clone());
            }
            let doc = layer.into_document()?;
            declarations.extend(doc.machines);
            values.push(doc.config);
        }

        let origin = project_origin.unwrap_or_else(|| PathBuf::from(assets::DEFAULTS_FILE));
        let definitions = discover_machines(declarations, &origin)?;

        let global_value = merge_layers(&values);
        let global = serde_yaml::from_value(global_value.clone()).map_err(|e| {
            HangarError::ConfigInvalid {
                path: origin.clone(),
                message: format!("Failed to parse merged config: {}", e),
            }
        })?;

        Ok(Self {
            global_value,
            global,
            definitions,
            origins,
        })
    }

    /// The merged global config.
    pub fn global(&self) -> &MachineConfig {
        &self.global
    }

    /// Machine definitions in declaration order.
    pub fn definitions(&self) -> &[MachineDefinition] {
        &self.definitions
    }

    pub fn definition(&self, name: &str) -> Option<&MachineDefinition> {
        self.definitions.iter().find(|d| d.name == name)
    }

    /// Machine names in declaration order.
    pub fn machine_names(&self) -> Vec<String> {
        self.definitions.iter().map(|d| d.name.clone()).collect()
    }

    /// The primary machine's definition, if there is one.
    pub fn primary(&self) -> Option<&MachineDefinition> {
        resolve_primary(&self.definitions)
    }

    /// Paths of every source that went into the global config.
    pub fn origins(&self) -> &[PathBuf] {
        &self.origins
    }

    /// Fold the config for one machine: global, then box, then override.
    ///
    /// # Errors
    ///
    /// Returns `MachineNotFound` for an unknown name, and `ConfigInvalid`
    /// when the box source is invalid or the merged result fails the schema.
    pub fn machine_config(&self, name: &str, box_layer: Option<ConfigLayer>) -> Result<MachineConfig> {
        let definition = self
            .definition(name)
            .ok_or_else(|| HangarError::MachineNotFound {
                name: name.to_string(),
            })?;

        let box_value = match box_layer {
            Some(layer) => layer.into_document()?.config,
            None => Value::Null,
        };

        let merged = merge_layers([&self.global_value, &box_value, &definition.config]);
        serde_yaml::from_value(merged).map_err(|e| HangarError::ConfigInvalid {
            path: PathBuf::from(format!("machine '{}'", name)),
            message: format!("Failed to parse merged config: {}", e),
        })
    }
}

/// Load the defaults plus the given sources.
///
/// A project path that does not exist is skipped, as is a missing home
/// source.
pub fn load_config(sources: &ConfigSources) -> Result<LoadedConfig> {
    let mut layers = vec![system_layer()?];

    if let Some(home) = &sources.home {
        if home.is_file() {
            layers.push(load_layer(home, LayerKind::Home)?);
        }
    }

    if let Some(project) = &sources.project {
        if project.is_file() {
            layers.push(load_layer(project, LayerKind::Project)?);
        }
    }

    LoadedConfig::from_layers(layers)
}

//! Machine definitions discovered in the project source.

use std::collections::HashSet;
use std::path::Path;

use serde_yaml::Value;
use tracing::debug;

use crate::config::schema::MachineDeclaration;
use crate::error::{HangarError, Result};

/// Name of the machine synthesized when the project declares none.
pub const DEFAULT_MACHINE_NAME: &str = "default";

/// A machine declared in the project source.
#[derive(Debug, Clone, PartialEq)]
pub struct MachineDefinition {
    pub name: String,
    /// Provider to use when the caller does not name one
    pub provider: Option<String>,
    pub primary: bool,
    pub autostart: bool,
    /// Override fragment, merged after every other layer
    pub config: Value,
}

impl MachineDefinition {
    /// The implicit definition used when no machines are declared.
    pub fn implicit() -> Self {
        Self {
            name: DEFAULT_MACHINE_NAME.to_string(),
            provider: None,
            primary: false,
            autostart: true,
            config: Value::Null,
        }
    }
}

impl From<MachineDeclaration> for MachineDefinition {
    fn from(decl: MachineDeclaration) -> Self {
        Self {
            name: decl.name,
            provider: decl.provider,
            primary: decl.primary,
            autostart: decl.autostart,
            config: decl.config,
        }
    }
}

/// Turn declarations into definitions, preserving declaration order.
///
/// # Errors
///
/// Returns `ConfigInvalid` for a name that cannot be used as a directory,
/// `DuplicateMachine` when a name repeats, and `MultiplePrimary` when more
/// than one machine is flagged primary.
pub fn discover_machines(
    declarations: Vec<MachineDeclaration>,
    origin: &Path,
) -> Result<Vec<MachineDefinition>> {
    if declarations.is_empty() {
        debug!("No machines declared, using implicit '{}'", DEFAULT_MACHINE_NAME);
        return Ok(vec![MachineDefinition::implicit()]);
    }

    let mut seen = HashSet::new();
    let mut definitions = Vec::with_capacity(declarations.len());

    for decl in declarations {
        validate_name(&decl.name, origin)?;
        if !seen.insert(decl.name.clone()) {
            return Err(HangarError::DuplicateMachine { name: decl.name });
        }
        definitions.push(MachineDefinition::from(decl));
    }

    let primaries: Vec<String> = definitions
        .iter()
        .filter(|d| d.primary)
        .map(|d| d.name.clone())
        .collect();
    if primaries.len() > 1 {
        return Err(HangarError::MultiplePrimary { names: primaries });
    }

    Ok(definitions)
}

/// Pick the primary machine.
///
/// A flagged machine wins; a lone machine is primary by default. With
/// several machines and none flagged there is no primary, and `None` is
/// returned rather than guessing.
pub fn resolve_primary(definitions: &[MachineDefinition]) -> Option<&MachineDefinition> {
    if let Some(flagged) = definitions.iter().find(|d| d.primary) {
        return Some(flagged);
    }

    match definitions {
        [only] => Some(only),
        _ => {
            debug!(
                "{} machines declared and none is primary",
                definitions.len()
            );
            None
        }
    }
}

/// Whether `name` can be used as a single directory component.
pub(crate) fn is_safe_name(name: &str) -> bool {
    !(name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.chars().any(char::is_control))
}

fn validate_name(name: &str, origin: &Path) -> Result<()> {
    if !is_safe_name(name) {
        return Err(HangarError::ConfigInvalid {
            path: origin.to_path_buf(),
            message: format!("invalid machine name '{}'", name),
        });
    }
    Ok(())
}

//! Path and setting resolution.
//!
//! Each setting an environment needs is resolved through the same chain:
//! 1. Explicit option passed by the caller
//! 2. `HANGAR_*` environment variable
//! 3. Built-in default

use std::io;
use std::path::{Path, PathBuf};

use crate::config::DEFAULT_PROJECT_FILE;
use crate::error::{HangarError, Result};

pub const CWD_VAR: &str = "HANGAR_CWD";
pub const HOME_VAR: &str = "HANGAR_HOME";
pub const PROJECT_FILE_VAR: &str = "HANGAR_PROJECT_FILE";
pub const DEFAULT_PROVIDER_VAR: &str = "HANGAR_DEFAULT_PROVIDER";

/// Name of the home directory under the user's home.
pub const HOME_DIR_NAME: &str = ".hangar";

/// Where a resolved setting came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingSource {
    /// Passed explicitly by the caller.
    Option,
    /// Read from an environment variable.
    EnvVar(&'static str),
    /// Built-in default.
    Default,
}

impl std::fmt::Display for SettingSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Option => write!(f, "option"),
            Self::EnvVar(var) => write!(f, "${}", var),
            Self::Default => write!(f, "default"),
        }
    }
}

/// A resolved setting and how it was determined.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub value: T,
    pub source: SettingSource,
}

impl<T> Resolved<T> {
    fn new(value: T, source: SettingSource) -> Self {
        Self { value, source }
    }
}

fn pick<T>(
    option: Option<T>,
    var: &'static str,
    lookup: &dyn Fn(&str) -> Option<String>,
    parse: impl FnOnce(String) -> T,
) -> Option<Resolved<T>> {
    if let Some(value) = option {
        return Some(Resolved::new(value, SettingSource::Option));
    }
    lookup(var)
        .filter(|value| !value.is_empty())
        .map(|value| Resolved::new(parse(value), SettingSource::EnvVar(var)))
}

/// Resolve the working directory. It must be an existing directory.
pub fn resolve_cwd(
    option: Option<&Path>,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> Result<Resolved<PathBuf>> {
    let resolved = match pick(option.map(Path::to_path_buf), CWD_VAR, lookup, PathBuf::from) {
        Some(resolved) => resolved,
        None => Resolved::new(std::env::current_dir()?, SettingSource::Default),
    };

    if !resolved.value.is_dir() {
        return Err(HangarError::EnvironmentNonExistentCwd {
            path: resolved.value,
        });
    }

    Ok(Resolved::new(
        std::path::absolute(&resolved.value)?,
        resolved.source,
    ))
}

/// `~/.hangar`, if the user's home directory is known.
pub fn default_home_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(HOME_DIR_NAME))
}

/// Resolve the home directory. It need not exist yet.
pub fn resolve_home_path(
    option: Option<&Path>,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> Result<Resolved<PathBuf>> {
    let resolved = match pick(option.map(Path::to_path_buf), HOME_VAR, lookup, PathBuf::from) {
        Some(resolved) => resolved,
        None => {
            let path = default_home_path().ok_or_else(|| HangarError::HomeDirectoryNotAccessible {
                path: PathBuf::from("~").join(HOME_DIR_NAME),
                source: io::Error::new(io::ErrorKind::NotFound, "user home directory is unknown"),
            })?;
            Resolved::new(path, SettingSource::Default)
        }
    };

    let absolute = std::path::absolute(&resolved.value).map_err(|source| {
        HangarError::HomeDirectoryNotAccessible {
            path: resolved.value.clone(),
            source,
        }
    })?;
    Ok(Resolved::new(absolute, resolved.source))
}

/// Resolve the project source file name.
pub fn resolve_project_file(
    option: Option<&str>,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> Resolved<String> {
    pick(option.map(str::to_string), PROJECT_FILE_VAR, lookup, |v| v)
        .unwrap_or_else(|| Resolved::new(DEFAULT_PROJECT_FILE.to_string(), SettingSource::Default))
}

/// Resolve an explicit default provider, if one was given.
///
/// Without one the environment falls back to the config.
pub fn resolve_default_provider(
    option: Option<&str>,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> Option<Resolved<String>> {
    pick(option.map(str::to_string), DEFAULT_PROVIDER_VAR, lookup, |v| v)
}

//! Installed boxes.
//!
//! Boxes live under `<home>/boxes/<name>/<provider>/`. Each box directory
//! holds a `metadata.json` and may ship its own `Hangarfile`, which becomes
//! the box layer of every machine built from it.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::machines::is_safe_name;
use crate::config::DEFAULT_PROJECT_FILE;
use crate::error::{HangarError, Result};

/// File every installed box carries.
pub const METADATA_FILE: &str = "metadata.json";

/// Contents of a box's `metadata.json`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BoxMetadata {
    /// Provider the box was built for, if recorded
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// One installed box for one provider.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxHandle {
    pub name: String,
    pub provider: String,
    pub directory: PathBuf,
}

impl BoxHandle {
    /// The box's own config source, when it ships one.
    pub fn hangarfile(&self) -> Option<PathBuf> {
        let path = self.directory.join(DEFAULT_PROJECT_FILE);
        path.is_file().then_some(path)
    }

    /// Read `metadata.json`.
    pub fn metadata(&self) -> Result<BoxMetadata> {
        let path = self.directory.join(METADATA_FILE);
        let content = fs::read_to_string(&path)?;
        serde_json::from_str(&content).map_err(|e| HangarError::ConfigInvalid {
            path,
            message: e.to_string(),
        })
    }
}

/// The boxes installed in a home directory.
#[derive(Debug, Clone)]
pub struct BoxCollection {
    directory: PathBuf,
}

impl BoxCollection {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Locate the box `name` built for `provider`.
    ///
    /// A directory without `metadata.json` is an incomplete install and is
    /// not found. Names that are not a single path component never match.
    pub fn find(&self, name: &str, provider: &str) -> Option<BoxHandle> {
        if !is_safe_name(name) || !is_safe_name(provider) {
            warn!("Rejecting box lookup '{}' for provider '{}'", name, provider);
            return None;
        }
        let directory = self.directory.join(name).join(provider);
        if !directory.join(METADATA_FILE).is_file() {
            debug!("Box '{}' not installed for provider '{}'", name, provider);
            return None;
        }
        Some(BoxHandle {
            name: name.to_string(),
            provider: provider.to_string(),
            directory,
        })
    }

    /// Like [`find`](Self::find), but a missing box is an error.
    pub fn require(&self, name: &str, provider: &str) -> Result<BoxHandle> {
        self.find(name, provider)
            .ok_or_else(|| HangarError::BoxNotFound {
                name: name.to_string(),
                provider: provider.to_string(),
            })
    }

    /// Every installed box, sorted by name then provider.
    ///
    /// A missing boxes directory means no boxes.
    pub fn all(&self) -> Result<Vec<BoxHandle>> {
        let mut boxes = Vec::new();
        if !self.directory.is_dir() {
            return Ok(boxes);
        }

        for entry in fs::read_dir(&self.directory)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                warn!("Skipping box with non-UTF-8 name: {:?}", entry.file_name());
                continue;
            };

            for provider_entry in fs::read_dir(entry.path())? {
                let provider_entry = provider_entry?;
                let Some(provider) = provider_entry.file_name().to_str().map(str::to_string)
                else {
                    continue;
                };
                if let Some(handle) = self.find(&name, &provider) {
                    boxes.push(handle);
                }
            }
        }

        boxes.sort_by(|a, b| (&a.name, &a.provider).cmp(&(&b.name, &b.provider)));
        Ok(boxes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn install(root: &Path, name: &str, provider: &str, metadata: &str) -> PathBuf {
        let dir = root.join(name).join(provider);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(METADATA_FILE), metadata).unwrap();
        dir
    }

    #[test]
    fn find_installed_box() {
        let temp = TempDir::new().unwrap();
        let dir = install(temp.path(), "base", "virtualbox", "{}");
        let boxes = BoxCollection::new(temp.path());

        let handle = boxes.find("base", "virtualbox").unwrap();
        assert_eq!(handle.directory, dir);
        assert!(handle.hangarfile().is_none());
    }

    #[test]
    fn find_is_per_provider() {
        let temp = TempDir::new().unwrap();
        install(temp.path(), "base", "virtualbox", "{}");
        let boxes = BoxCollection::new(temp.path());

        assert!(boxes.find("base", "vmware").is_none());
        assert!(matches!(
            boxes.require("base", "vmware"),
            Err(HangarError::BoxNotFound { name, provider }) if name == "base" && provider == "vmware"
        ));
    }

    #[test]
    fn directory_without_metadata_is_not_a_box() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("half").join("virtualbox")).unwrap();
        let boxes = BoxCollection::new(temp.path());
        assert!(boxes.find("half", "virtualbox").is_none());
        assert!(boxes.all().unwrap().is_empty());
    }

    #[test]
    fn names_outside_the_collection_are_not_found() {
        let temp = TempDir::new().unwrap();
        let boxes_dir = temp.path().join("home").join("boxes");
        fs::create_dir_all(&boxes_dir).unwrap();
        install(temp.path(), "evil", "virtualbox", "{}");
        let boxes = BoxCollection::new(&boxes_dir);

        assert!(boxes.find("../../evil", "virtualbox").is_none());
        assert!(boxes.find("..", "virtualbox").is_none());
        assert!(boxes.find("base", "../virtualbox").is_none());
        assert!(boxes.find("", "virtualbox").is_none());
        assert!(matches!(
            boxes.require("../../evil", "virtualbox"),
            Err(HangarError::BoxNotFound { .. })
        ));
    }

    #[test]
    fn hangarfile_is_located() {
        let temp = TempDir::new().unwrap();
        let dir = install(temp.path(), "base", "virtualbox", "{}");
        fs::write(dir.join("Hangarfile"), "ssh:\n  port: 100\n").unwrap();

        let handle = BoxCollection::new(temp.path())
            .find("base", "virtualbox")
            .unwrap();
        assert_eq!(handle.hangarfile(), Some(dir.join("Hangarfile")));
    }

    #[test]
    fn metadata_is_parsed() {
        let temp = TempDir::new().unwrap();
        install(
            temp.path(),
            "base",
            "virtualbox",
            r#"{"provider": "virtualbox", "version": "1.2.0", "extra": true}"#,
        );
        let handle = BoxCollection::new(temp.path())
            .find("base", "virtualbox")
            .unwrap();

        let metadata = handle.metadata().unwrap();
        assert_eq!(metadata.provider.as_deref(), Some("virtualbox"));
        assert_eq!(metadata.version.as_deref(), Some("1.2.0"));
    }

    #[test]
    fn malformed_metadata_is_invalid() {
        let temp = TempDir::new().unwrap();
        install(temp.path(), "base", "virtualbox", "not json");
        let handle = BoxCollection::new(temp.path())
            .find("base", "virtualbox")
            .unwrap();
        assert!(matches!(
            handle.metadata(),
            Err(HangarError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn all_lists_sorted() {
        let temp = TempDir::new().unwrap();
        install(temp.path(), "zeta", "virtualbox", "{}");
        install(temp.path(), "alpha", "vmware", "{}");
        install(temp.path(), "alpha", "docker", "{}");
        fs::write(temp.path().join("stray.txt"), "").unwrap();

        let listed: Vec<(String, String)> = BoxCollection::new(temp.path())
            .all()
            .unwrap()
            .into_iter()
            .map(|b| (b.name, b.provider))
            .collect();

        assert_eq!(
            listed,
            [
                ("alpha".to_string(), "docker".to_string()),
                ("alpha".to_string(), "vmware".to_string()),
                ("zeta".to_string(), "virtualbox".to_string()),
            ]
        );
    }

    #[test]
    fn all_with_missing_directory_is_empty() {
        let temp = TempDir::new().unwrap();
        let boxes = BoxCollection::new(temp.path().join("boxes"));
        assert!(boxes.all().unwrap().is_empty());
    }
}

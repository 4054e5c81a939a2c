//! Boxes command implementation.
//!
//! The `hangar boxes` command lists installed boxes.

use crate::environment::Environment;
use crate::error::Result;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// The boxes command implementation.
pub struct BoxesCommand<'a> {
    env: &'a Environment,
}

impl<'a> BoxesCommand<'a> {
    pub fn new(env: &'a Environment) -> Self {
        Self { env }
    }
}

impl Command for BoxesCommand<'_> {
    fn execute(&self, ui: &dyn UserInterface) -> Result<CommandResult> {
        let boxes = self.env.boxes().all()?;
        if boxes.is_empty() {
            ui.detail(&format!(
                "No boxes installed in {}",
                self.env.boxes().directory().display()
            ));
            return Ok(CommandResult::success());
        }

        for installed in boxes {
            let version = installed
                .metadata()
                .ok()
                .and_then(|m| m.version)
                .map(|v| format!(" {}", v))
                .unwrap_or_default();
            ui.info(&format!(
                "{} ({}){}",
                installed.name, installed.provider, version
            ));
        }
        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::EnvironmentOptions;
    use crate::ui::{Level, MockUI};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn lists_installed_boxes() {
        let (project, home) = (TempDir::new().unwrap(), TempDir::new().unwrap());
        let env = Environment::new(
            EnvironmentOptions::new()
                .cwd(project.path())
                .home_path(home.path()),
        )
        .unwrap();
        let dir = home.path().join("boxes").join("base").join("virtualbox");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("metadata.json"), r#"{"version": "2.0"}"#).unwrap();
        let ui = MockUI::new();

        BoxesCommand::new(&env)
            .execute(&ui)
            .unwrap();

        assert_eq!(ui.at_level(Level::Info), ["base (virtualbox) 2.0"]);
    }

    #[test]
    fn empty_collection_says_so() {
        let (project, home) = (TempDir::new().unwrap(), TempDir::new().unwrap());
        let env = Environment::new(
            EnvironmentOptions::new()
                .cwd(project.path())
                .home_path(home.path()),
        )
        .unwrap();
        let ui = MockUI::new();

        BoxesCommand::new(&env)
            .execute(&ui)
            .unwrap();

        assert!(ui.at_level(Level::Info).is_empty());
        assert_eq!(ui.at_level(Level::Detail).len(), 1);
    }
}

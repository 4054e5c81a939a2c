//! Error types for Hangar operations.
//!
//! This module defines [`HangarError`], the primary error type used throughout
//! the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Construction, config, and lookup failures are returned immediately with a
//!   typed variant; nothing is partially built
//! - Stage failures surface as [`HangarError::Pipeline`], which keeps the
//!   failing stage's name and the context as it stood when the failure unwound
//! - Use `anyhow::Error` (via `HangarError::Other`) for unexpected errors

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::action::ActionContext;

/// Core error type for Hangar operations.
#[derive(Debug, Error)]
pub enum HangarError {
    /// The working directory does not exist.
    #[error("Working directory does not exist: {path}")]
    EnvironmentNonExistentCwd { path: PathBuf },

    /// The home directory could not be created or accessed.
    #[error("Home directory is not accessible: {path}: {source}")]
    HomeDirectoryNotAccessible {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A provider with this name is already registered.
    #[error("Provider '{name}' is already registered")]
    ProviderAlreadyRegistered { name: String },

    /// A config source failed to parse or failed schema validation.
    #[error("Invalid config in {path}: {message}")]
    ConfigInvalid { path: PathBuf, message: String },

    /// Two machines were declared with the same name.
    #[error("Machine '{name}' is declared more than once")]
    DuplicateMachine { name: String },

    /// More than one machine is flagged primary.
    #[error("Only one machine may be primary, found: {}", names.join(", "))]
    MultiplePrimary { names: Vec<String> },

    /// No machine with this name is declared.
    #[error("Unknown machine: {name}")]
    MachineNotFound { name: String },

    /// No provider with this name is registered.
    #[error("Unknown provider: {name}")]
    ProviderNotFound { name: String },

    /// The box a machine is configured with is not installed.
    #[error("Box '{name}' for provider '{provider}' is not installed")]
    BoxNotFound { name: String, provider: String },

    /// The provider does not implement the requested action.
    #[error("Provider '{provider}' does not implement action '{action}'")]
    UnimplementedProviderAction { action: String, provider: String },

    /// A stage failed; carried up through the enclosing stages.
    #[error("Stage '{stage}' failed: {source}")]
    StageFailed {
        stage: String,
        source: Box<HangarError>,
    },

    /// A pipeline run failed.
    #[error(transparent)]
    Pipeline(Box<PipelineError>),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Broad category of a [`HangarError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid working or home directory, or a bad registry setup.
    Construction,
    /// Parse, schema, or merge failure.
    Config,
    /// Unknown machine, provider, box, or action.
    Lookup,
    /// A stage failed during a run.
    Pipeline,
    Io,
    Other,
}

impl HangarError {
    /// The category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EnvironmentNonExistentCwd { .. }
            | Self::HomeDirectoryNotAccessible { .. }
            | Self::ProviderAlreadyRegistered { .. } => ErrorKind::Construction,
            Self::ConfigInvalid { .. }
            | Self::DuplicateMachine { .. }
            | Self::MultiplePrimary { .. } => ErrorKind::Config,
            Self::MachineNotFound { .. }
            | Self::ProviderNotFound { .. }
            | Self::BoxNotFound { .. }
            | Self::UnimplementedProviderAction { .. } => ErrorKind::Lookup,
            Self::StageFailed { .. } | Self::Pipeline(_) => ErrorKind::Pipeline,
            Self::Io(_) => ErrorKind::Io,
            Self::Other(_) => ErrorKind::Other,
        }
    }

    /// Returns the pipeline failure details if this is a pipeline error.
    pub fn as_pipeline(&self) -> Option<&PipelineError> {
        match self {
            Self::Pipeline(err) => Some(err),
            _ => None,
        }
    }
}

/// A failed pipeline run.
///
/// Every stage entered before the failing one has already run its
/// post-delegate logic by the time this value exists.
#[derive(Debug)]
pub struct PipelineError {
    /// Name of the stage that raised the failure.
    pub stage: String,
    /// The failure itself.
    pub source: HangarError,
    /// The context as it stood after unwinding.
    pub context: ActionContext,
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Stage '{}' failed: {}", self.stage, self.source)
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Result type alias for Hangar operations.
pub type Result<T> = std::result::Result<T, HangarError>;

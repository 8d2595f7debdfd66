//! Error types for cmdtree

use std::path::PathBuf;
use thiserror::Error;

/// Error thrown when the commands root or a requested group directory is unusable
#[derive(Debug, Error)]
#[error("Cannot discover commands in {}: {reason}", path.display())]
pub struct DiscoveryError {
    pub path: PathBuf,
    pub reason: String,
}

impl DiscoveryError {
    pub fn new(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Error thrown when a candidate plugin directory does not satisfy the plugin contract
#[derive(Debug, Clone, Error)]
#[error("Invalid plugin '{command}/{subcommand}' at {}: {reason}", directory.display())]
pub struct PluginValidationError {
    pub command: String,
    pub subcommand: String,
    pub directory: PathBuf,
    pub reason: String,
}

/// Error thrown when a plugin entry point cannot be loaded
#[derive(Debug, Error)]
#[error("Failed to load plugin '{command}/{subcommand}' at {}: {reason}", directory.display())]
pub struct PluginLoadError {
    pub command: String,
    pub subcommand: String,
    pub directory: PathBuf,
    pub reason: String,
}

/// Error thrown when scaffolding would overwrite an existing plugin
#[derive(Debug, Error)]
#[error("Plugin already exists at {}. Use --force to overwrite entry and meta.yaml", path.display())]
pub struct ScaffoldConflictError {
    pub path: PathBuf,
}

/// General cmdtree error type
#[derive(Debug, Error)]
pub enum CmdtreeError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    PluginValidation(#[from] PluginValidationError),

    #[error(transparent)]
    PluginLoad(#[from] PluginLoadError),

    #[error(transparent)]
    ScaffoldConflict(#[from] ScaffoldConflictError),

    #[error("Invalid {kind} '{value}'. Use only letters, numbers, underscore, and hyphen.")]
    InvalidName { kind: &'static str, value: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CmdtreeError>;

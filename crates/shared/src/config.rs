//! Configuration types for cmdtree

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::PathBuf;

/// Branded application and binary name
pub const APP_NAME: &str = "cmdtree";

/// Entry point file inside every plugin directory
pub const ENTRY_FILE: &str = "entry";

/// Metadata file inside every plugin (and optionally group) directory
pub const META_FILE: &str = "meta.yaml";

/// Directory name of the commands root when none is given
pub const DEFAULT_COMMANDS_DIR: &str = "commands";

/// Overrides the base directory used by `dev new-plugin`
pub const SCAFFOLD_DIR_ENV: &str = "CMDTREE_SCAFFOLD_DIR";

/// Set to `1` when an entry point is run to describe itself
pub const DESCRIBE_ENV: &str = "CMDTREE_DESCRIBE";

/// Log filter directive for the binary
pub const LOG_ENV: &str = "CMDTREE_LOG";

/// Group name owned by the built-in developer commands
pub const RESERVED_GROUP: &str = "dev";

/// Resolved runtime configuration, built once per process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub app_name: String,
    pub version: String,

    /// Root of the `<command>/<subcommand>` plugin tree
    pub commands_dir: PathBuf,

    /// Base directory for generated scaffolds
    pub scaffold_dir: PathBuf,
}

impl AppConfig {
    /// Config rooted at `commands_dir`, scaffolding into the same tree
    pub fn new(commands_dir: impl Into<PathBuf>) -> Self {
        let commands_dir = commands_dir.into();
        Self {
            app_name: APP_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            scaffold_dir: commands_dir.clone(),
            commands_dir,
        }
    }

    pub fn with_scaffold_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scaffold_dir = dir.into();
        self
    }

    /// Resolve from an optional `--commands-dir` value and the process environment
    pub fn resolve(commands_dir: Option<PathBuf>) -> Self {
        Self::resolve_with(commands_dir, std::env::var_os(SCAFFOLD_DIR_ENV))
    }

    /// Resolve with an explicit scaffold override instead of reading the environment
    pub fn resolve_with(commands_dir: Option<PathBuf>, scaffold_override: Option<OsString>) -> Self {
        let config = Self::new(commands_dir.unwrap_or_else(default_commands_dir));
        match scaffold_override.filter(|value| !value.is_empty()) {
            Some(dir) => config.with_scaffold_dir(dir),
            None => config,
        }
    }

    /// One-line application banner
    pub fn banner(&self) -> String {
        format!("{} v{}", self.app_name, self.version)
    }

    /// Environment handed to every plugin process
    pub fn plugin_env(&self) -> Vec<(&'static str, String)> {
        vec![
            ("CMDTREE_APP_NAME", self.app_name.clone()),
            ("CMDTREE_VERSION", self.version.clone()),
            (
                "CMDTREE_COMMANDS_DIR",
                self.commands_dir.display().to_string(),
            ),
        ]
    }
}

/// `commands/` next to the executable when it exists, else relative to the working directory
fn default_commands_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_COMMANDS_DIR)))
        .filter(|dir| dir.is_dir())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_COMMANDS_DIR))
}

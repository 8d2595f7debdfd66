//! Plugin descriptor types for cmdtree

use crate::config::{ENTRY_FILE, META_FILE};
use crate::error::{PluginLoadError, PluginValidationError};
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};

/// Parsed `meta.yaml` of a plugin or group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginMeta {
    /// One-line help shown in listings
    #[serde(rename = "shortHelp")]
    pub short_help: String,

    /// Keys the loader does not interpret, whatever their key type
    #[serde(flatten)]
    pub extra: Mapping,
}

impl PluginMeta {
    pub fn new(short_help: impl Into<String>) -> Self {
        Self {
            short_help: short_help.into(),
            extra: Mapping::new(),
        }
    }

    /// Parse metadata text; the error is a human-readable reason
    pub fn parse(content: &str) -> Result<Self, String> {
        let value: Value =
            serde_yaml::from_str(content).map_err(|e| format!("unparsable {}: {}", META_FILE, e))?;
        let Value::Mapping(mut extra) = value else {
            return Err(format!("{} must be a mapping", META_FILE));
        };

        match extra.remove("shortHelp") {
            Some(Value::String(short_help)) if !short_help.trim().is_empty() => {
                Ok(Self { short_help, extra })
            }
            _ => Err("shortHelp must be a non-empty string".to_string()),
        }
    }

    /// Read and parse a metadata file
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
        Self::parse(&content)
    }

    pub fn to_yaml(&self) -> crate::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// A discovered, validated subcommand. Holds metadata only, never a loaded command.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginDescriptor {
    pub command_name: String,
    pub subcommand_name: String,
    pub short_help: String,
    pub directory: PathBuf,
}

impl PluginDescriptor {
    pub fn entry_path(&self) -> PathBuf {
        self.directory.join(ENTRY_FILE)
    }

    pub fn meta_path(&self) -> PathBuf {
        self.directory.join(META_FILE)
    }

    /// `command/subcommand`, used in diagnostics
    pub fn qualified_name(&self) -> String {
        format!("{}/{}", self.command_name, self.subcommand_name)
    }

    /// Build a validation error scoped to this plugin
    pub fn invalid(&self, reason: impl Into<String>) -> PluginValidationError {
        PluginValidationError {
            command: self.command_name.clone(),
            subcommand: self.subcommand_name.clone(),
            directory: self.directory.clone(),
            reason: reason.into(),
        }
    }

    /// Build a load error scoped to this plugin
    pub fn load_failed(&self, reason: impl Into<String>) -> PluginLoadError {
        PluginLoadError {
            command: self.command_name.clone(),
            subcommand: self.subcommand_name.clone(),
            directory: self.directory.clone(),
            reason: reason.into(),
        }
    }
}

/// Subcommands sharing one top-level command name
#[derive(Debug, Clone, Default)]
pub struct CommandGroup {
    pub name: String,
    pub directory: PathBuf,

    /// From the optional group-level `meta.yaml`
    pub short_help: Option<String>,

    /// Valid plugins, sorted by subcommand name
    pub plugins: Vec<PluginDescriptor>,

    /// Candidates excluded from listings, sorted by subcommand name
    pub rejected: Vec<PluginValidationError>,
}

impl CommandGroup {
    pub fn get(&self, subcommand: &str) -> Option<&PluginDescriptor> {
        self.plugins.iter().find(|p| p.subcommand_name == subcommand)
    }

    pub fn rejected(&self, subcommand: &str) -> Option<&PluginValidationError> {
        self.rejected.iter().find(|r| r.subcommand == subcommand)
    }

    pub fn subcommand_names(&self) -> Vec<&str> {
        self.plugins
            .iter()
            .map(|p| p.subcommand_name.as_str())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

/// Directory names are exposed with underscores turned into hyphens
pub fn normalize_name(dir_name: &str) -> String {
    dir_name.replace('_', "-")
}

/// Directories the loader never treats as commands
pub fn is_hidden_name(dir_name: &str) -> bool {
    dir_name.starts_with('.') || dir_name.starts_with("__")
}

#[cfg(test)]
mod tests {
    use super::*;

    // ============== PluginMeta Tests ==============

    #[test]
    fn test_meta_parse_minimal() {
        let meta = PluginMeta::parse("shortHelp: Add two integers.\n").unwrap();
        assert_eq!(meta.short_help, "Add two integers.");
        assert!(meta.extra.is_empty());
    }

    #[test]
    fn test_meta_keeps_extra_keys() {
        let meta = PluginMeta::parse("shortHelp: Ping a host.\nhidden: false\npackaged: true\n")
            .unwrap();
        assert_eq!(meta.extra.len(), 2);
        assert!(meta.extra.contains_key("packaged"));
    }

    #[test]
    fn test_meta_accepts_non_string_keys() {
        let meta = PluginMeta::parse("shortHelp: Add.\n1: one\ntrue: x\n").unwrap();
        assert_eq!(meta.short_help, "Add.");
        assert_eq!(meta.extra.len(), 2);
        assert_eq!(
            meta.extra.get(Value::Number(1i64.into())),
            Some(&Value::String("one".to_string()))
        );
        assert!(meta.extra.contains_key(Value::Bool(true)));
    }

    #[test]
    fn test_meta_rejects_missing_short_help() {
        let err = PluginMeta::parse("description: nope\n").unwrap_err();
        assert!(err.contains("shortHelp"));
    }

    #[test]
    fn test_meta_rejects_blank_short_help() {
        let err = PluginMeta::parse("shortHelp: \"   \"\n").unwrap_err();
        assert!(err.contains("non-empty"));
    }

    #[test]
    fn test_meta_rejects_non_string_short_help() {
        assert!(PluginMeta::parse("shortHelp: 42\n").is_err());
        assert!(PluginMeta::parse("shortHelp:\n  - a\n").is_err());
    }

    #[test]
    fn test_meta_rejects_non_mapping() {
        let err = PluginMeta::parse("- just\n- a list\n").unwrap_err();
        assert!(err.contains("mapping"));

        let err = PluginMeta::parse("").unwrap_err();
        assert!(err.contains("mapping"));
    }

    #[test]
    fn test_meta_rejects_unparsable() {
        let err = PluginMeta::parse("shortHelp: [unclosed\n").unwrap_err();
        assert!(err.contains("unparsable"));
    }

    #[test]
    fn test_meta_yaml_roundtrip_quotes_special_text() {
        let meta = PluginMeta::new("Multiply: two # integers");
        let yaml = meta.to_yaml().unwrap();
        let parsed = PluginMeta::parse(&yaml).unwrap();
        assert_eq!(parsed.short_help, "Multiply: two # integers");
    }

    // ============== Descriptor / Group Tests ==============

    fn descriptor(sub: &str) -> PluginDescriptor {
        PluginDescriptor {
            command_name: "compute".to_string(),
            subcommand_name: sub.to_string(),
            short_help: format!("{} help", sub),
            directory: PathBuf::from("/cmds/compute").join(sub),
        }
    }

    #[test]
    fn test_descriptor_paths() {
        let d = descriptor("add");
        assert_eq!(d.entry_path(), PathBuf::from("/cmds/compute/add/entry"));
        assert_eq!(d.meta_path(), PathBuf::from("/cmds/compute/add/meta.yaml"));
        assert_eq!(d.qualified_name(), "compute/add");
    }

    #[test]
    fn test_group_lookup() {
        let group = CommandGroup {
            name: "compute".to_string(),
            plugins: vec![descriptor("add"), descriptor("sub")],
            rejected: vec![descriptor("bogus").invalid("missing meta.yaml")],
            ..Default::default()
        };

        assert_eq!(group.subcommand_names(), vec!["add", "sub"]);
        assert!(group.get("add").is_some());
        assert!(group.get("bogus").is_none());
        assert_eq!(group.rejected("bogus").unwrap().reason, "missing meta.yaml");
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("new_command"), "new-command");
        assert_eq!(normalize_name("add"), "add");
    }

    #[test]
    fn test_hidden_names() {
        assert!(is_hidden_name(".git"));
        assert!(is_hidden_name("__pycache__"));
        assert!(!is_hidden_name("compute"));
    }
}

//! Command manifest types
//!
//! An entry point run in describe mode prints a JSON [`CommandManifest`]. This is the
//! typed interface every plugin must satisfy before it can be invoked.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::OnceLock;

/// How a parameter appears on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    /// Positional value
    #[default]
    Argument,
    /// `--name <value>`
    Option,
    /// `--name` with no value
    Flag,
}

/// Value type a parameter is validated against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    #[default]
    String,
    Int,
    Float,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Int => "int",
            ValueType::Float => "float",
        }
    }

    /// Whether `value` parses as this type
    pub fn accepts(&self, value: &str) -> bool {
        match self {
            ValueType::String => true,
            ValueType::Int => value.parse::<i64>().is_ok(),
            ValueType::Float => value.parse::<f64>().is_ok(),
        }
    }
}

/// Names taken by the generated `--help` flag
const RESERVED_PARAMS: &[&str] = &["help"];

/// One declared parameter of a plugin command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamSpec {
    pub name: String,

    #[serde(default)]
    pub kind: ParamKind,

    #[serde(default, rename = "type")]
    pub value_type: ValueType,

    pub help: Option<String>,

    /// Defaults to true for arguments and false for options and flags
    pub required: Option<bool>,

    pub default: Option<String>,
}

impl ParamSpec {
    pub fn argument(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Argument,
            value_type,
            help: None,
            required: None,
            default: None,
        }
    }

    pub fn option(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            kind: ParamKind::Option,
            ..Self::argument(name, value_type)
        }
    }

    pub fn flag(name: impl Into<String>) -> Self {
        Self {
            kind: ParamKind::Flag,
            ..Self::argument(name, ValueType::String)
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn is_required(&self) -> bool {
        match self.kind {
            ParamKind::Flag => false,
            ParamKind::Argument => self.required.unwrap_or(self.default.is_none()),
            ParamKind::Option => self.required.unwrap_or(false),
        }
    }
}

/// The command object exported by a plugin entry point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandManifest {
    pub name: String,

    #[serde(default)]
    pub params: Vec<ParamSpec>,
}

fn param_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*$").expect("valid regex"))
}

impl CommandManifest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    pub fn with_param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// Check the manifest describes an invocable command
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("manifest name must be a non-empty string".to_string());
        }

        let mut seen = HashSet::new();
        let mut optional_argument: Option<&str> = None;
        for param in &self.params {
            if !param_name_pattern().is_match(&param.name) {
                return Err(format!("invalid parameter name '{}'", param.name));
            }
            if RESERVED_PARAMS.contains(&param.name.as_str()) {
                return Err(format!("parameter name '{}' is reserved", param.name));
            }
            if !seen.insert(param.name.as_str()) {
                return Err(format!("duplicate parameter '{}'", param.name));
            }
            if let Some(default) = &param.default {
                if param.kind == ParamKind::Flag {
                    return Err(format!("flag '{}' cannot declare a default", param.name));
                }
                if !param.value_type.accepts(default) {
                    return Err(format!(
                        "default '{}' of parameter '{}' is not a valid {}",
                        default,
                        param.name,
                        param.value_type.as_str()
                    ));
                }
            }
            if param.kind == ParamKind::Argument {
                if param.is_required() {
                    if let Some(previous) = optional_argument {
                        return Err(format!(
                            "required argument '{}' follows optional argument '{}'",
                            param.name, previous
                        ));
                    }
                } else {
                    optional_argument = Some(&param.name);
                }
            }
        }
        Ok(())
    }

    /// Deserialize describe-mode output and validate it
    pub fn from_json(json: &str) -> Result<Self, String> {
        let manifest: Self = serde_json::from_str(json.trim())
            .map_err(|e| format!("entry does not export a command manifest: {}", e))?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn arguments(&self) -> impl Iterator<Item = &ParamSpec> {
        self.params.iter().filter(|p| p.kind == ParamKind::Argument)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_with_defaults() {
        let manifest = CommandManifest::from_json(
            r#"{"name": "add", "params": [{"name": "a", "type": "int"}, {"name": "b", "type": "int"}]}"#,
        )
        .unwrap();

        assert_eq!(manifest.name, "add");
        assert_eq!(manifest.params.len(), 2);
        assert_eq!(manifest.params[0].kind, ParamKind::Argument);
        assert_eq!(manifest.params[0].value_type, ValueType::Int);
        assert!(manifest.params[0].is_required());
    }

    #[test]
    fn test_from_json_without_params() {
        let manifest = CommandManifest::from_json("{\"name\": \"stub\"}\n").unwrap();
        assert!(manifest.params.is_empty());
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let err = CommandManifest::from_json("hello world").unwrap_err();
        assert!(err.contains("command manifest"));
    }

    #[test]
    fn test_from_json_rejects_unknown_kind() {
        let json = r#"{"name": "x", "params": [{"name": "a", "kind": "switch"}]}"#;
        assert!(CommandManifest::from_json(json).is_err());
    }

    #[test]
    fn test_validate_blank_name() {
        assert!(CommandManifest::new("  ").validate().is_err());
    }

    #[test]
    fn test_validate_duplicate_param() {
        let manifest = CommandManifest::new("x")
            .with_param(ParamSpec::argument("a", ValueType::Int))
            .with_param(ParamSpec::option("a", ValueType::Int));
        assert!(manifest.validate().unwrap_err().contains("duplicate"));
    }

    #[test]
    fn test_validate_bad_param_name() {
        let manifest = CommandManifest::new("x").with_param(ParamSpec::flag("--verbose"));
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_validate_flag_default() {
        let manifest =
            CommandManifest::new("x").with_param(ParamSpec::flag("verbose").with_default("1"));
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_validate_reserved_help_param() {
        let err = CommandManifest::from_json(
            r#"{"name": "h", "params": [{"name": "help", "kind": "flag"}]}"#,
        )
        .unwrap_err();
        assert!(err.contains("reserved"));
    }

    #[test]
    fn test_validate_default_matches_type() {
        let err = CommandManifest::from_json(
            r#"{"name": "x", "params": [{"name": "n", "kind": "option", "type": "int", "default": "abc"}]}"#,
        )
        .unwrap_err();
        assert!(err.contains("not a valid int"));

        let manifest = CommandManifest::new("x")
            .with_param(ParamSpec::option("count", ValueType::Int).with_default("-3"))
            .with_param(ParamSpec::option("ratio", ValueType::Float).with_default("0.5"))
            .with_param(ParamSpec::option("name", ValueType::String).with_default("abc"));
        assert!(manifest.validate().is_ok());

        let manifest = CommandManifest::new("x")
            .with_param(ParamSpec::argument("ratio", ValueType::Float).with_default("half"));
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_validate_required_after_optional() {
        let manifest = CommandManifest::new("x")
            .with_param(ParamSpec::argument("a", ValueType::String).with_default("1"))
            .with_param(ParamSpec::argument("b", ValueType::String));
        assert!(manifest.validate().unwrap_err().contains("follows"));
    }

    #[test]
    fn test_required_defaults() {
        assert!(ParamSpec::argument("a", ValueType::String).is_required());
        assert!(!ParamSpec::argument("a", ValueType::String)
            .with_default("x")
            .is_required());
        assert!(!ParamSpec::option("count", ValueType::Int).is_required());
        assert!(!ParamSpec::flag("verbose").is_required());
    }

    #[test]
    fn test_arguments_filter() {
        let manifest = CommandManifest::new("ping")
            .with_param(ParamSpec::argument("host", ValueType::String))
            .with_param(ParamSpec::option("count", ValueType::Int).with_default("3"))
            .with_param(ParamSpec::flag("verbose"));
        let names: Vec<_> = manifest.arguments().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["host"]);
    }
}

//! Plugin scaffolding - generate a minimal plugin directory

use regex::Regex;
use shared::{
    normalize_name, CmdtreeError, CommandManifest, PluginMeta, ScaffoldConflictError, ENTRY_FILE,
    META_FILE,
};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::info;

/// What to generate
#[derive(Debug, Clone, Default)]
pub struct ScaffoldRequest {
    pub command: String,
    pub subcommand: String,
    pub short_help: Option<String>,

    /// Written to the group `meta.yaml` when that file does not exist yet
    pub group_help: Option<String>,

    /// Overwrite `entry` and `meta.yaml` of an existing plugin
    pub force: bool,
}

impl ScaffoldRequest {
    pub fn new(command: impl Into<String>, subcommand: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            subcommand: subcommand.into(),
            ..Default::default()
        }
    }

    pub fn with_short_help(mut self, short_help: impl Into<String>) -> Self {
        self.short_help = Some(short_help.into());
        self
    }

    pub fn with_group_help(mut self, group_help: impl Into<String>) -> Self {
        self.group_help = Some(group_help.into());
        self
    }

    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    fn help_text(&self) -> String {
        self.short_help
            .as_deref()
            .filter(|help| !help.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("TODO: describe {} {}.", self.command, self.subcommand))
    }
}

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid regex"))
}

/// Writes new plugins below a base directory
#[derive(Debug, Clone)]
pub struct Scaffolder {
    base: PathBuf,
}

impl Scaffolder {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Create the plugin directory and return the files written
    ///
    /// Names are restricted to letters, digits, `_` and `-`, so the target always
    /// stays inside the base directory. An existing plugin directory is a
    /// [`ScaffoldConflictError`] unless `force` is set.
    pub fn create(&self, request: &ScaffoldRequest) -> shared::Result<Vec<PathBuf>> {
        validate_name("command", &request.command)?;
        validate_name("subcommand", &request.subcommand)?;

        let group_dir = self.base.join(&request.command);
        let target = group_dir.join(&request.subcommand);
        if target.exists() && !request.force {
            return Err(ScaffoldConflictError { path: target }.into());
        }

        std::fs::create_dir_all(&target)?;
        let mut written = Vec::new();

        if let Some(group_help) = &request.group_help {
            let group_meta = group_dir.join(META_FILE);
            if !group_meta.exists() {
                std::fs::write(&group_meta, PluginMeta::new(group_help.as_str()).to_yaml()?)?;
                written.push(group_meta);
            }
        }

        let meta_path = target.join(META_FILE);
        std::fs::write(&meta_path, PluginMeta::new(request.help_text()).to_yaml()?)?;
        written.push(meta_path);

        let entry_path = target.join(ENTRY_FILE);
        std::fs::write(&entry_path, entry_stub(request)?)?;
        make_executable(&entry_path)?;
        written.push(entry_path);

        info!(path = %target.display(), "Scaffolded plugin");
        Ok(written)
    }
}

fn validate_name(kind: &'static str, value: &str) -> shared::Result<()> {
    if name_pattern().is_match(value) {
        Ok(())
    } else {
        Err(CmdtreeError::InvalidName {
            kind,
            value: value.to_string(),
        })
    }
}

/// POSIX shell entry that describes itself and otherwise reports it is unimplemented
fn entry_stub(request: &ScaffoldRequest) -> shared::Result<String> {
    let manifest = serde_json::to_string(&CommandManifest::new(normalize_name(&request.subcommand)))?;
    Ok(format!(
        r#"#!/bin/sh
# {command} {subcommand}
if [ "${{CMDTREE_DESCRIBE:-}}" = "1" ]; then
  cat <<'MANIFEST'
{manifest}
MANIFEST
  exit 0
fi
echo "not implemented"
exit 2
"#,
        command = request.command,
        subcommand = request.subcommand,
        manifest = manifest,
    ))
}

#[cfg(unix)]
fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::discover_subcommands;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_create_plugin() {
        let tmp = TempDir::new().unwrap();
        let scaffolder = Scaffolder::new(tmp.path());
        let request =
            ScaffoldRequest::new("compute", "mul").with_short_help("Multiply two integers.");

        let written = scaffolder.create(&request).unwrap();
        let target = tmp.path().join("compute").join("mul");
        assert_eq!(written, vec![target.join(META_FILE), target.join(ENTRY_FILE)]);

        let meta = PluginMeta::from_file(&target.join(META_FILE)).unwrap();
        assert_eq!(meta.short_help, "Multiply two integers.");
        assert!(fs::read_to_string(target.join(ENTRY_FILE))
            .unwrap()
            .starts_with("#!/bin/sh"));
    }

    #[test]
    fn test_created_plugin_is_discoverable() {
        let tmp = TempDir::new().unwrap();
        Scaffolder::new(tmp.path())
            .create(&ScaffoldRequest::new("compute", "mul").with_short_help("Multiply."))
            .unwrap();

        let group = discover_subcommands(tmp.path(), "compute").unwrap();
        assert_eq!(group.subcommand_names(), vec!["mul"]);
        assert_eq!(group.plugins[0].short_help, "Multiply.");
    }

    #[test]
    fn test_conflict_leaves_existing_plugin_untouched() {
        let tmp = TempDir::new().unwrap();
        let scaffolder = Scaffolder::new(tmp.path());
        scaffolder
            .create(&ScaffoldRequest::new("compute", "mul").with_short_help("First."))
            .unwrap();
        let meta_path = tmp.path().join("compute").join("mul").join(META_FILE);
        let before = fs::read_to_string(&meta_path).unwrap();

        let err = scaffolder
            .create(&ScaffoldRequest::new("compute", "mul").with_short_help("Second."))
            .unwrap_err();
        assert!(matches!(err, CmdtreeError::ScaffoldConflict(_)));
        assert_eq!(fs::read_to_string(&meta_path).unwrap(), before);
    }

    #[test]
    fn test_conflict_on_existing_empty_directory() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("compute").join("mul")).unwrap();

        let err = Scaffolder::new(tmp.path())
            .create(&ScaffoldRequest::new("compute", "mul"))
            .unwrap_err();
        assert!(matches!(err, CmdtreeError::ScaffoldConflict(_)));
        assert!(!tmp.path().join("compute").join("mul").join(META_FILE).exists());
    }

    #[test]
    fn test_force_overwrites() {
        let tmp = TempDir::new().unwrap();
        let scaffolder = Scaffolder::new(tmp.path());
        scaffolder
            .create(&ScaffoldRequest::new("compute", "mul").with_short_help("First."))
            .unwrap();
        scaffolder
            .create(
                &ScaffoldRequest::new("compute", "mul")
                    .with_short_help("Second.")
                    .force(true),
            )
            .unwrap();

        let meta =
            PluginMeta::from_file(&tmp.path().join("compute").join("mul").join(META_FILE)).unwrap();
        assert_eq!(meta.short_help, "Second.");
    }

    #[test]
    fn test_default_help_text() {
        let tmp = TempDir::new().unwrap();
        Scaffolder::new(tmp.path())
            .create(&ScaffoldRequest::new("net", "trace"))
            .unwrap();

        let meta =
            PluginMeta::from_file(&tmp.path().join("net").join("trace").join(META_FILE)).unwrap();
        assert_eq!(meta.short_help, "TODO: describe net trace.");
    }

    #[test]
    fn test_group_help_written_once() {
        let tmp = TempDir::new().unwrap();
        let scaffolder = Scaffolder::new(tmp.path());
        let written = scaffolder
            .create(&ScaffoldRequest::new("compute", "mul").with_group_help("Arithmetic."))
            .unwrap();
        assert_eq!(written.len(), 3);

        let written = scaffolder
            .create(&ScaffoldRequest::new("compute", "div").with_group_help("Changed."))
            .unwrap();
        assert_eq!(written.len(), 2);

        let group = discover_subcommands(tmp.path(), "compute").unwrap();
        assert_eq!(group.short_help.as_deref(), Some("Arithmetic."));
    }

    #[test]
    fn test_rejects_invalid_names() {
        let tmp = TempDir::new().unwrap();
        let scaffolder = Scaffolder::new(tmp.path());

        for (command, subcommand) in [("../escape", "x"), ("ok", "a/b"), ("ok", ".."), ("", "x")] {
            let err = scaffolder
                .create(&ScaffoldRequest::new(command, subcommand))
                .unwrap_err();
            assert!(matches!(err, CmdtreeError::InvalidName { .. }));
        }
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_entry_is_executable() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        Scaffolder::new(tmp.path())
            .create(&ScaffoldRequest::new("compute", "mul"))
            .unwrap();

        let mode = fs::metadata(tmp.path().join("compute").join("mul").join(ENTRY_FILE))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn test_entry_stub_embeds_manifest() {
        let stub = entry_stub(&ScaffoldRequest::new("admin", "new_command")).unwrap();
        assert!(stub.contains(r#"{"name":"new-command","params":[]}"#));
        assert!(stub.contains("${CMDTREE_DESCRIBE:-}"));
    }
}

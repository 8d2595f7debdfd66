//! Plugin discovery - scan the `<command>/<subcommand>` tree without running plugin code

use shared::{
    is_hidden_name, normalize_name, CommandGroup, DiscoveryError, PluginDescriptor, PluginMeta,
    PluginValidationError, ENTRY_FILE, META_FILE,
};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// List the command groups under `root`
///
/// Every visible subdirectory is a candidate group; its plugins are not inspected here.
pub fn discover_groups(root: &Path) -> Result<BTreeSet<String>, DiscoveryError> {
    ensure_directory(root)?;
    let dirs = child_directories(root).map_err(|e| DiscoveryError::new(root, e.to_string()))?;
    Ok(dirs.iter().map(|(name, _)| normalize_name(name)).collect())
}

/// Validate every candidate plugin of `group` and return them sorted by name
///
/// Invalid candidates are skipped with a warning and recorded in
/// [`CommandGroup::rejected`]; only a missing group directory is an error.
pub fn discover_subcommands(root: &Path, group: &str) -> Result<CommandGroup, DiscoveryError> {
    ensure_directory(root)?;
    let directory = group_directory(root, group)?;
    let candidates = child_directories(&directory)
        .map_err(|e| DiscoveryError::new(&directory, e.to_string()))?;

    let mut result = CommandGroup {
        name: group.to_string(),
        short_help: read_group_help(&directory),
        directory,
        ..Default::default()
    };

    for (dir_name, path) in candidates {
        let name = normalize_name(&dir_name);
        let outcome = if result.get(&name).is_some() {
            Err(PluginValidationError {
                command: group.to_string(),
                subcommand: name.clone(),
                directory: path,
                reason: format!("duplicate subcommand name '{}'", name),
            })
        } else {
            validate_plugin(group, &name, path)
        };

        match outcome {
            Ok(descriptor) => {
                debug!(plugin = %descriptor.qualified_name(), "Discovered plugin");
                result.plugins.push(descriptor);
            }
            Err(err) => {
                warn!(
                    plugin = %format!("{}/{}", err.command, err.subcommand),
                    directory = %err.directory.display(),
                    reason = %err.reason,
                    "Skipping invalid plugin"
                );
                result.rejected.push(err);
            }
        }
    }

    result
        .plugins
        .sort_by(|a, b| a.subcommand_name.cmp(&b.subcommand_name));
    result.rejected.sort_by(|a, b| a.subcommand.cmp(&b.subcommand));
    Ok(result)
}

/// Short help of a group, read from its optional `meta.yaml`
pub fn read_group_help(directory: &Path) -> Option<String> {
    let meta_path = directory.join(META_FILE);
    if !meta_path.is_file() {
        return None;
    }
    match PluginMeta::from_file(&meta_path) {
        Ok(meta) => Some(meta.short_help),
        Err(reason) => {
            warn!(path = %meta_path.display(), %reason, "Ignoring invalid group metadata");
            None
        }
    }
}

/// Locate the directory of a (normalized) group name
pub fn group_directory(root: &Path, group: &str) -> Result<PathBuf, DiscoveryError> {
    let exact = root.join(group);
    if exact.is_dir() && !is_hidden_name(group) {
        return Ok(exact);
    }

    let dirs = child_directories(root).map_err(|e| DiscoveryError::new(root, e.to_string()))?;
    dirs.into_iter()
        .find(|(name, _)| normalize_name(name) == group)
        .map(|(_, path)| path)
        .ok_or_else(|| DiscoveryError::new(exact, format!("no such command group '{}'", group)))
}

fn validate_plugin(
    command: &str,
    subcommand: &str,
    directory: PathBuf,
) -> Result<PluginDescriptor, PluginValidationError> {
    let invalid = |directory: PathBuf, reason: String| PluginValidationError {
        command: command.to_string(),
        subcommand: subcommand.to_string(),
        directory,
        reason,
    };

    let meta_path = directory.join(META_FILE);
    let entry_path = directory.join(ENTRY_FILE);

    let missing: Vec<&str> = [(ENTRY_FILE, &entry_path), (META_FILE, &meta_path)]
        .into_iter()
        .filter(|(_, path)| !path.is_file())
        .map(|(file, _)| file)
        .collect();
    if !missing.is_empty() {
        return Err(invalid(directory, format!("missing {}", missing.join(", "))));
    }

    let meta = match PluginMeta::from_file(&meta_path) {
        Ok(meta) => meta,
        Err(reason) => return Err(invalid(directory, reason)),
    };

    Ok(PluginDescriptor {
        command_name: command.to_string(),
        subcommand_name: subcommand.to_string(),
        short_help: meta.short_help,
        directory,
    })
}

fn ensure_directory(path: &Path) -> Result<(), DiscoveryError> {
    if !path.exists() {
        return Err(DiscoveryError::new(path, "directory does not exist"));
    }
    if !path.is_dir() {
        return Err(DiscoveryError::new(path, "not a directory"));
    }
    Ok(())
}

/// Visible child directories sorted by file name
fn child_directories(dir: &Path) -> std::io::Result<Vec<(String, PathBuf)>> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            debug!(path = %path.display(), "Ignoring non UTF-8 directory name");
            continue;
        };
        if is_hidden_name(&name) {
            continue;
        }
        dirs.push((name, path));
    }
    dirs.sort();
    Ok(dirs)
}

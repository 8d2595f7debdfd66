//! Plugin loading and execution
//!
//! Loading runs the entry point once in describe mode and checks the manifest it
//! prints. Nothing here is called during discovery.

use shared::{
    CmdtreeError, CommandManifest, ParamSpec, PluginDescriptor, PluginLoadError, DESCRIBE_ENV,
};
use std::process::{Command, ExitStatus, Stdio};
use tracing::debug;

/// A command that can be invoked after loading
pub trait Invocable {
    /// Command name as declared by the plugin
    fn name(&self) -> &str;

    /// Declared parameters, in command-line order
    fn params(&self) -> &[ParamSpec];

    /// One-line help text
    fn about(&self) -> &str;

    /// Run with validated arguments and return the process exit code
    fn invoke(&self, args: &[String], env: &[(&'static str, String)]) -> shared::Result<i32>;
}

/// A plugin whose entry point has been loaded and satisfied the manifest contract
#[derive(Debug, Clone)]
pub struct LoadedCommand {
    pub descriptor: PluginDescriptor,
    pub manifest: CommandManifest,
}

impl Invocable for LoadedCommand {
    fn name(&self) -> &str {
        &self.manifest.name
    }

    fn params(&self) -> &[ParamSpec] {
        &self.manifest.params
    }

    fn about(&self) -> &str {
        &self.descriptor.short_help
    }

    fn invoke(&self, args: &[String], env: &[(&'static str, String)]) -> shared::Result<i32> {
        let entry = self.descriptor.entry_path();
        debug!(plugin = %self.descriptor.qualified_name(), ?args, "Invoking plugin");

        let status = Command::new(&entry)
            .args(args)
            .envs(env.iter().map(|(key, value)| (*key, value.as_str())))
            .env("CMDTREE_PLUGIN_DIR", &self.descriptor.directory)
            .env_remove(DESCRIBE_ENV)
            .status()
            .map_err(|e| {
                CmdtreeError::from(
                    self.descriptor
                        .load_failed(format!("failed to start entry: {}", e)),
                )
            })?;

        Ok(exit_code(status))
    }
}

/// Load the entry point of one plugin
///
/// Fails if the entry is missing or not executable, exits non-zero in describe
/// mode, or prints something that is not a valid command manifest.
pub fn load_subcommand(descriptor: &PluginDescriptor) -> Result<LoadedCommand, PluginLoadError> {
    let entry = descriptor.entry_path();
    if !entry.is_file() {
        return Err(descriptor.load_failed("entry not found"));
    }
    check_executable(descriptor)?;

    debug!(plugin = %descriptor.qualified_name(), "Describing plugin");
    let output = Command::new(&entry)
        .env(DESCRIBE_ENV, "1")
        .current_dir(&descriptor.directory)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| descriptor.load_failed(format!("failed to start entry: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = stderr.trim();
        let mut reason = format!(
            "entry failed while loading (exit code {})",
            exit_code(output.status)
        );
        if !detail.is_empty() {
            reason.push_str(": ");
            reason.push_str(detail);
        }
        return Err(descriptor.load_failed(reason));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let manifest = CommandManifest::from_json(&stdout).map_err(|e| descriptor.load_failed(e))?;
    if manifest.name != descriptor.subcommand_name {
        debug!(
            plugin = %descriptor.qualified_name(),
            declared = %manifest.name,
            "Manifest name differs from directory name"
        );
    }

    Ok(LoadedCommand {
        descriptor: descriptor.clone(),
        manifest,
    })
}

#[cfg(unix)]
fn check_executable(descriptor: &PluginDescriptor) -> Result<(), PluginLoadError> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = std::fs::metadata(descriptor.entry_path())
        .map_err(|e| descriptor.load_failed(format!("cannot stat entry: {}", e)))?;
    if metadata.permissions().mode() & 0o111 == 0 {
        return Err(descriptor.load_failed("entry is not executable"));
    }
    Ok(())
}

#[cfg(not(unix))]
fn check_executable(_descriptor: &PluginDescriptor) -> Result<(), PluginLoadError> {
    Ok(())
}

fn exit_code(status: ExitStatus) -> i32 {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    status.code().unwrap_or(1)
}

//! Registry - the discovered command tree of one process

use crate::loader::{discover_groups, discover_subcommands, group_directory, read_group_help};
use crate::runner::{load_subcommand, LoadedCommand};
use shared::{
    CmdtreeError, CommandGroup, DiscoveryError, PluginDescriptor, PluginLoadError, RESERVED_GROUP,
};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Command groups found under a commands root
///
/// Built once per process and passed by reference. Only group names are read up
/// front; subcommands are discovered when a group is addressed.
#[derive(Debug, Clone)]
pub struct Registry {
    root: PathBuf,
    groups: BTreeSet<String>,
}

impl Registry {
    /// Scan `root` for command groups
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, DiscoveryError> {
        let root = root.into();
        let mut groups = discover_groups(&root)?;
        if groups.remove(RESERVED_GROUP) {
            warn!(
                path = %root.join(RESERVED_GROUP).display(),
                "Ignoring command group '{}': the name is reserved",
                RESERVED_GROUP
            );
        }
        Ok(Self { root, groups })
    }

    /// A registry with no groups, for a commands root that does not exist
    pub fn empty(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            groups: BTreeSet::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Group names in sorted order
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(String::as_str)
    }

    pub fn contains(&self, group: &str) -> bool {
        self.groups.contains(group)
    }

    /// Short help of a group, without scanning its plugins
    pub fn group_help(&self, group: &str) -> Option<String> {
        if !self.contains(group) {
            return None;
        }
        group_directory(&self.root, group)
            .ok()
            .and_then(|dir| read_group_help(&dir))
    }

    /// Discover the subcommands of one group
    pub fn group(&self, group: &str) -> Result<CommandGroup, DiscoveryError> {
        if !self.contains(group) {
            return Err(DiscoveryError::new(
                self.root.join(group),
                format!("no such command group '{}'", group),
            ));
        }
        discover_subcommands(&self.root, group)
    }

    /// Find the descriptor of an explicitly requested subcommand
    ///
    /// A rejected plugin surfaces its validation error here.
    pub fn resolve(&self, group: &str, subcommand: &str) -> shared::Result<PluginDescriptor> {
        let found = self.group(group)?;
        if let Some(descriptor) = found.get(subcommand) {
            return Ok(descriptor.clone());
        }
        if let Some(rejected) = found.rejected(subcommand) {
            return Err(CmdtreeError::PluginValidation(rejected.clone()));
        }
        Err(DiscoveryError::new(
            found.directory.join(subcommand),
            format!("no such subcommand '{} {}'", group, subcommand),
        )
        .into())
    }

    /// Load the entry point of a resolved plugin
    pub fn load(&self, descriptor: &PluginDescriptor) -> Result<LoadedCommand, PluginLoadError> {
        load_subcommand(descriptor)
    }

    /// Every group with its subcommands, skipping groups that fail to scan
    pub fn scan_all(&self) -> Vec<CommandGroup> {
        self.groups()
            .filter_map(|name| match self.group(name) {
                Ok(group) => Some(group),
                Err(err) => {
                    warn!(group = name, error = %err, "Skipping command group");
                    None
                }
            })
            .collect()
    }
}

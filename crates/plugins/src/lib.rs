//! # cmdtree Plugins
//!
//! Lazy discovery of `<command>/<subcommand>` plugin directories, on-demand loading
//! of their entry points, and scaffolding of new plugins.

pub mod loader;
pub mod registry;
pub mod runner;
pub mod scaffold;

pub use loader::{discover_groups, discover_subcommands};
pub use registry::Registry;
pub use runner::{load_subcommand, Invocable, LoadedCommand};
pub use scaffold::{ScaffoldRequest, Scaffolder};

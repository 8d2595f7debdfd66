//! # cmdtree Shared
//!
//! Common types used by the plugin loader and the CLI.

pub mod config;
pub mod error;
pub mod manifest;
pub mod plugin;

// Re-exports
pub use config::*;
pub use error::*;
pub use manifest::*;
pub use plugin::*;

//! CLI Commands

pub mod dev;

pub use dev::{DevCommand, DevSubcommand};

//! # cmdtree CLI
//!
//! Root dispatcher for plugins discovered under a commands directory, plus the
//! built-in `dev` utilities.

pub mod commands;
pub mod dispatcher;
pub mod params;

pub use dispatcher::{run, GlobalArgs};

//! CLI commands module for schemanotify.

pub mod app;
pub mod commands;

pub use app::{Cli, Commands, ConfigAction, EventArgs};

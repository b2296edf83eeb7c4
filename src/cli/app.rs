use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::Parser;

use crate::notify::events::SchemaChangeEvent;

/// Schema change notification dispatch
#[derive(Parser, Debug)]
#[command(name = "schemanotify", author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
    /// Config file path (defaults to the platform config dir or SCHEMANOTIFY_CONFIG)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Send a schema change notification through the configured channel
    Send {
        #[command(flatten)]
        event: EventArgs,
        /// Override the configured send timeout (seconds)
        #[arg(long)]
        timeout_secs: Option<u64>,
        /// Print the delivery result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the message that would be sent, without sending it
    Render {
        #[command(flatten)]
        event: EventArgs,
    },
    /// List the supported channel types
    Channels,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand, Debug)]
pub enum ConfigAction {
    /// Initialize configuration file
    Init {
        /// Overwrite an existing file without asking
        #[arg(short, long)]
        force: bool,
    },
    /// Show current configuration
    Show,
    /// Validate configuration
    Validate,
    /// Print the configuration file path
    Path,
}

#[derive(clap::Args, Debug, Clone)]
pub struct EventArgs {
    /// Connection whose source schema changed
    #[arg(long)]
    pub connection_id: String,
    /// Human-readable connection name
    #[arg(long)]
    pub name: Option<String>,
    /// The change breaks downstream syncs
    #[arg(long)]
    pub breaking: bool,
    /// Link to the connection page
    #[arg(long, default_value = "")]
    pub url: String,
    /// Detection time (RFC 3339), defaults to now
    #[arg(long)]
    pub detected_at: Option<DateTime<Utc>>,
}

impl EventArgs {
    pub fn to_event(&self) -> SchemaChangeEvent {
        let event = SchemaChangeEvent::new(
            self.connection_id.clone(),
            self.breaking,
            self.detected_at.unwrap_or_else(Utc::now),
            self.url.clone(),
        );
        match &self.name {
            Some(name) => event.with_connection_name(name.clone()),
            None => event,
        }
    }
}

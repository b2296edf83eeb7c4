use std::process::ExitCode;

use clap::Parser;
use schemanotify::cli::commands::{channels, config, render, send};
use schemanotify::cli::{Cli, Commands, ConfigAction};
use schemanotify::config::Paths;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(Paths::config_file);

    match &cli.command {
        Commands::Send {
            event,
            timeout_secs,
            json,
        } => send::handle_send(&config_path, event, *timeout_secs, *json, cli.debug).await,
        Commands::Render { event } => {
            render::handle_render(event)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Channels => {
            channels::handle_channels();
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config { action } => {
            match action {
                ConfigAction::Init { force } => config::handle_init(&config_path, *force)?,
                ConfigAction::Show => config::handle_show(&config_path)?,
                ConfigAction::Validate => config::handle_validate(&config_path)?,
                ConfigAction::Path => config::handle_path(&config_path),
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

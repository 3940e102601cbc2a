//! ZMK slider CLI
//!
//! Bind a ZMK keyboard's vendor HID interface and read or drive its value.

use clap::Parser;
use tracing::info;

use zmk_slider::config::Config;

mod cli;
use cli::{Cli, Commands};

mod commands;
mod logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let command = cli.command.as_ref().unwrap_or(&Commands::Tui);

    if matches!(command, Commands::Tui) {
        let path = logging::init_file(&cli.log_level)?;
        eprintln!("Logging to {}", path.display());
    } else {
        logging::init(&cli.log_level);
    }

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    info!("Loading config from {:?}", config_path);
    let mut config = Config::load(&config_path)?;
    cli.apply_overrides(&mut config);

    match command {
        Commands::List { all, json } => commands::device::list(&config, *all, *json),
        Commands::Read { timeout_ms } => {
            commands::device::read(&config, cli.prompt, *timeout_ms).await
        }
        Commands::Set { value } => commands::device::set(&config, cli.prompt, *value).await,
        Commands::Watch => commands::interactive::watch(&config, cli.prompt).await,
        Commands::Tui => commands::interactive::tui(&config, cli.prompt).await,
    }
}

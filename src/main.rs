//! External keyboard bridge CLI
//!
//! Scans for USB keyboards, requests access, and forwards decoded key
//! presses to an application over a JSON-lines channel.

use anyhow::Result;
use clap::Parser;
use tracing::info;

use extkbd::BridgeConfig;

mod cli;
use cli::{Cli, Commands};

mod commands;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config
    let config_path = cli.config.clone().unwrap_or_else(BridgeConfig::default_path);
    let config = BridgeConfig::load(&config_path)?;

    // Initialize logging (stderr, stdout belongs to `serve`)
    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!("Loaded config from {:?}", config_path);

    let host = commands::open_host(cli.fixture.as_deref())?;

    match cli.command {
        None | Some(Commands::Scan { json: false }) => {
            commands::scan::scan(host, &config, false)?;
        }
        Some(Commands::Scan { json: true }) => {
            commands::scan::scan(host, &config, true)?;
        }
        Some(Commands::RequestPermission { device_id, wait }) => {
            commands::permission::request(host, &config, &device_id, wait).await?;
        }
        Some(Commands::Listen { device }) => {
            commands::listen::listen(host, &config, device).await?;
        }
        Some(Commands::Watch) => {
            commands::watch::watch(host, &config).await?;
        }
        Some(Commands::Serve { input }) => {
            commands::serve::serve(host, &config, input).await?;
        }
        Some(Commands::List) => {
            commands::list::list(host.as_ref(), &config)?;
        }
    }

    Ok(())
}

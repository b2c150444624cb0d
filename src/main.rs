use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};

use wsrelay::cli::{Cli, Command};
use wsrelay::client::run_client;
use wsrelay::config::{load_config, load_config_from};
use wsrelay::hub::Hub;
use wsrelay::transport::start_websocket_server;
use wsrelay::utils::{Result, logging};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    match cli.command {
        Command::Server { addr, config } => {
            if let Err(e) = run_server(addr, config).await {
                error!("Server failed: {e}");
                std::process::exit(1);
            }
        }
        Command::Client {
            url,
            message,
            wait_secs,
        } => match run_client(&url, &message, Duration::from_secs(wait_secs)).await {
            Ok(relayed) => println!("Relayed: {}", String::from_utf8_lossy(&relayed)),
            Err(e) => {
                error!("Client failed: {e}");
                std::process::exit(1);
            }
        },
    }
}

async fn run_server(addr: Option<String>, config: Option<PathBuf>) -> Result<()> {
    let mut settings = match config {
        Some(path) => load_config_from(&path)?,
        None => load_config()?,
    };
    if let Some(addr) = addr {
        settings = settings.with_listen_addr(&addr)?;
    }

    let settings = Arc::new(settings);
    let hub = Hub::spawn(&settings.hub);

    tokio::select! {
        served = start_websocket_server(settings, hub) => served?,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting.");
        }
    }

    Ok(())
}

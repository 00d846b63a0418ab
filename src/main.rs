mod config;
mod dev;
mod error;
mod logger;
mod server;
mod supervisor;
mod watcher;

use anyhow::{Context, Result};
use clap::Parser;
use config::{Cli, Command};
use log::{error, info};
use server::HttpServer;

fn main() -> Result<()> {
    let cli = Cli::parse();

    logger::init(&cli.log_timezone, cli.log_file.as_deref())
        .context("Failed to open log file")?;

    let result = match cli.command {
        Some(Command::Serve(config)) => {
            info!("Starting static HTTP server with config: {:?}", config);

            HttpServer::new(&config)
                .with_context(|| format!("Failed to bind {}:{}", config.host, config.port))
                .map(|server| server.run())
        }
        None => dev::run(&cli.dev),
    };

    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}

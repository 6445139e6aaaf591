use std::{path::PathBuf, process::ExitCode};

use ::tracing::{error, info_span};
use anyhow::{Context, Result};
use clap::Parser;
use service::Service;

mod config;
mod encoding;
mod http_objects;
mod middleware;
mod routes;
mod service;
mod tracing;
use crate::tracing::setup_tracing;

#[cfg(test)]
mod testing;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[arg(short, long, value_name = "config file", help = "Path to config file")]
    config: Option<PathBuf>,
}

fn load_config(cli: &Cli) -> Result<config::ServerConfig> {
    let config = match &cli.config {
        Some(path) => config::ServerConfig::from_path(&path.to_string_lossy())
            .with_context(|| format!("error loading config file {}", path.display()))?,
        None => config::ServerConfig::default(),
    };
    match std::env::var(config::SERVER_PORT_ENV) {
        Ok(port) => config
            .with_port(&port)
            .with_context(|| format!("invalid {}", config::SERVER_PORT_ENV)),
        Err(_) => Ok(config),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error loading configuration: {:?}", err);
            return ExitCode::FAILURE;
        }
    };

    setup_tracing(&config);

    let root_span = info_span!("clidownload-server");
    let _guard = root_span.enter();

    let service = match Service::new(config).await {
        Ok(service) => service,
        Err(err) => {
            error!("Error creating service: {:?}", err);
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = service.start().await {
        error!("Error starting service: {:?}", err);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

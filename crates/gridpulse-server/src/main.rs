// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of GridPulse.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use gridpulse_core::GridService;
use gridpulse_isone::{IsoNeClient, IsoNeDataSource};
use gridpulse_server::config::ServerConfig;
use gridpulse_server::routes::{self, AppState};

#[derive(Parser)]
#[command(name = "gridpulse-server")]
#[command(about = "ISO New England grid dashboard backend", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "gridpulse.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = ServerConfig::load(&cli.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level)),
        )
        .init();

    if cli.config.exists() {
        info!(path = %cli.config.display(), "Loaded configuration");
    } else {
        warn!(
            path = %cli.config.display(),
            "No configuration file found, using defaults with environment overrides"
        );
    }

    let client = IsoNeClient::new(&config.grid.upstream)?;
    info!(base_url = %client.base_url(), "ISO-NE client ready");
    let source = Arc::new(IsoNeDataSource::new(Arc::new(client)));
    let service = GridService::new(source, config.grid.clone());

    let app = routes::router(AppState { service }, &config.server.static_dir);

    let addr = config.listen_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("GridPulse listening on {addr}");
    axum::serve(listener, app).await?;

    Ok(())
}

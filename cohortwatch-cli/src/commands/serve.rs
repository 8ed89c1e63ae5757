//! Serve command for running the relay server
//!
//! The serve command runs the relay, which provides:
//! - the viewer page and `/cohort/:cohort` switch endpoint
//! - a WebSocket stream of cohort events for every viewer
//! - health and status endpoints

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use cohortwatch_bus::{CohortName, IggyTopicSource};
use cohortwatch_server::{AppState, RelayServer, ServerConfig};
use tracing::{error, info};

use crate::config::CohortwatchConfig;

/// Arguments for the serve command
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Iggy server address (host:port)
    #[arg(long)]
    pub bus_address: Option<String>,

    /// Cohort to follow at startup
    #[arg(short, long)]
    pub cohort: Option<String>,
}

/// Command-line flags take precedence over loaded configuration
fn apply_args(args: ServeArgs, mut config: CohortwatchConfig) -> CohortwatchConfig {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(address) = args.bus_address {
        config.bus.address = address;
    }
    if args.cohort.is_some() {
        config.server.cohort = args.cohort;
    }
    config
}

/// Run the serve command
pub async fn run(args: ServeArgs, config: CohortwatchConfig) -> Result<()> {
    let config = apply_args(args, config);
    let initial = config
        .server
        .cohort
        .clone()
        .map(CohortName::new)
        .transpose()
        .context("Invalid initial cohort")?;

    info!(
        bus = %config.bus.address,
        stream = %config.bus.stream,
        "Starting cohortwatch server on {}:{}",
        config.server.host,
        config.server.port
    );

    let naming = config.bus.topics.clone();
    let source = Arc::new(IggyTopicSource::new(config.bus));
    let state = Arc::new(AppState::new(
        source,
        naming,
        config.server.broadcast_capacity,
    ));

    if let Some(cohort) = initial {
        let relay = Arc::clone(&state.relay);
        tokio::spawn(async move {
            if let Err(e) = relay.select_cohort(cohort).await {
                error!("{}", e);
            }
        });
    }

    let server_config = ServerConfig::new(config.server.host, config.server.port);
    RelayServer::with_state(server_config, state)
        .run_until(shutdown_signal())
        .await
        .map_err(Into::into)
}

/// Resolves on Ctrl-C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
        // Without a signal handler, run until killed.
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

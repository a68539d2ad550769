//! winavg node entry point.
//!
//! Reads `<topic> <payload>` lines from stdin, publishes them on the bus
//! and prints every average the linked devices publish.

use clap::Parser;
use eyre::{Result, WrapErr};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use winavg_core::DeviceId;
use winavg_node::{BusMessage, Config, Service, input};

/// [clap] derived struct to handle command line parameters.
#[derive(Debug, Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Path to the YAML configuration file
    #[clap(long, env = "WINAVG_CONFIG")]
    config: PathBuf,

    /// Log filter directives, e.g. "info" or "winavg_core=debug"
    #[clap(long, env = "RUST_LOG", default_value = "info")]
    log_filter: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&args.log_filter).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(config_file = %args.config.display(), "Loading configuration");
    let config = Config::load(&args.config)?;

    info!(
        service = %config.service.id,
        num_devices = config.devices.len(),
        stats_interval = ?config.service.stats_interval,
        "Configuration loaded"
    );

    let mut service = Service::start(config.service.id.clone(), config.service.stats_interval);
    let printer = tokio::spawn(print_averages(service.bus().tap()));

    for device in &config.devices {
        let status = service
            .link(DeviceId::new(device.id.clone()), &device.config)
            .await;
        if !status.is_success() {
            warn!(device = %device.id, %status, "Device was not linked");
        }
    }

    let lines = input::stdin_lines()?;
    tokio::select! {
        result = input::feed(service.bus(), lines) => {
            match result {
                Ok(published) => info!(published, "Input ended"),
                Err(err) => error!(error = %err, "Failed to read input"),
            }
        }
        result = shutdown_signal() => {
            result?;
        }
    }

    let stopped = service.shutdown().await;
    info!(num_devices = stopped.len(), "winavg node shutting down");

    // The tap closes once the last bus handle is gone.
    let _ = printer.await;

    Ok(())
}

/// Print every message a device publishes.
async fn print_averages(mut tap: mpsc::UnboundedReceiver<BusMessage>) {
    while let Some(message) = tap.recv().await {
        if message.origin.is_some() {
            println!(
                "{} {}",
                message.topic,
                String::from_utf8_lossy(&message.payload)
            );
        }
    }
}

#[cfg(unix)]
async fn shutdown_signal() -> Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm =
        signal(SignalKind::terminate()).wrap_err("Failed to install SIGTERM handler")?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.wrap_err("Failed to listen for Ctrl-C")?,
        _ = sigterm.recv() => {}
    }
    info!("Received shutdown signal");
    Ok(())
}

#[cfg(not(unix))]
async fn shutdown_signal() -> Result<()> {
    tokio::signal::ctrl_c()
        .await
        .wrap_err("Failed to listen for Ctrl-C")?;
    info!("Received shutdown signal");
    Ok(())
}

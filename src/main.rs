//! Sleeping Bedrock listener.
//!
//! Occupies the Bedrock port while the real server is down, rejects every
//! client with the configured message and reports each attempt as a wake
//! request.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────┐
//!                      │              SLEEPING LISTENER               │
//!   Bedrock client     │  ┌──────────┐   ┌─────────────┐              │
//!   ───── UDP ─────────┼─▶│  engine  │──▶│     net     │──▶ wake ─────┼──▶ orchestrator
//!   ◀── pong/reject ───┼──│ raknet/udp│  │ interceptor │              │
//!                      │  └────▲─────┘   └─────────────┘              │
//!                      │       │ init / close                         │
//!                      │  ┌────┴────────────────────────────────────┐ │
//!                      │  │ lifecycle: startup, controller, signals │ │
//!                      │  └─────────────────────────────────────────┘ │
//!                      │  config · observability · resilience         │
//!                      └──────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;

use sleeping_bedrock::config::{load_settings, validate_settings, ConfigError, Settings};
use sleeping_bedrock::lifecycle::signals;
use sleeping_bedrock::observability::{init_logging, metrics, TracingSink};
use sleeping_bedrock::{PlayerSignal, Shutdown, SleepingBedrock, UdpEngineFactory, WakeCallback};

#[derive(Parser)]
#[command(name = "sleeping-bedrock")]
#[command(about = "Stand-in Bedrock listener that wakes the real server on connect", long_about = None)]
struct Cli {
    /// TOML settings file; defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured Bedrock port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Close the listener and exit after the first wake request.
    #[arg(long)]
    exit_on_wake: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => load_settings(path)?,
        None => Settings::default(),
    };
    if let Some(port) = cli.port {
        settings.bedrock_port = port;
        validate_settings(&settings).map_err(ConfigError::Validation)?;
    }

    init_logging(&settings.observability)?;

    tracing::info!("sleeping-bedrock v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        port = settings.bedrock_port,
        bind_address = %settings.bind_address,
        hide_ip_in_logs = settings.hide_ip_in_logs,
        "Configuration loaded"
    );

    if settings.observability.metrics_enabled {
        match settings.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %settings.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let mut shutdown_rx = shutdown.subscribe();
    signals::spawn_signal_listener(shutdown.clone());

    let (wake_tx, mut wake_rx) = mpsc::unbounded_channel();
    let wake: WakeCallback = Arc::new(move |signal: PlayerSignal| {
        let _ = wake_tx.send(signal);
    });

    let listener = SleepingBedrock::new(
        Arc::new(settings),
        UdpEngineFactory::with_host_shutdown(shutdown.clone()),
        Arc::new(TracingSink::default()),
        wake,
    );
    listener.init().await?;
    tracing::info!(state = %listener.state(), "Waiting for players");

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            Some(signal) = wake_rx.recv() => {
                tracing::info!(%signal, "Wake requested");
                if cli.exit_on_wake {
                    break;
                }
            }
        }
    }

    listener.close().await?;
    tracing::info!("Shutdown complete");
    Ok(())
}

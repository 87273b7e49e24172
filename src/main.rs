//! socketme
//!
//! Accepts raw TCP connections, answers a fixed set of HTTP/1.1 routes, and on
//! `GET /socketme` performs the WebSocket handshake and pushes a single JSON
//! text frame before closing.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──▶ net::listener ──▶ http::server ──spawn──▶ http::handler
//!                                                           │
//!                        ┌──────────────────────────────────┤
//!                        ▼                                  ▼
//!                 http::request                      routing::router
//!              (request line, headers)         (page / upgrade / not found)
//!                                                           │
//!                                  ┌────────────────────────┤
//!                                  ▼                        ▼
//!                          http::response         websocket::{handshake,
//!                        (200/400/404, 101)          payload, frame}
//! ```

use std::path::PathBuf;

use clap::Parser;

use socketme::config::{load_config, ServerConfig};
use socketme::lifecycle::{signals, startup, Shutdown};
use socketme::observability::init_logging;

#[derive(Parser)]
#[command(name = "socketme")]
#[command(about = "HTTP server with a one-shot WebSocket push route", long_about = None)]
struct Cli {
    /// Optional TOML configuration file; defaults are used without one.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };

    init_logging(&config.observability);

    tracing::info!("socketme v0.1.0 starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        extended_length = config.websocket.extended_length,
        drain_timeout_secs = config.lifecycle.drain_timeout_secs,
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    tokio::spawn(signals::shutdown_on_ctrl_c(shutdown.clone()));

    startup::run(config, &shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

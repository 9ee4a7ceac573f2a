//! # nullmodem - two-player session arbitration
//!
//! Connects to a peer, runs the setup handshake, and prints the resulting
//! session: which address the peer is at and which player slot we hold.
//!
//! ```text
//! nullmodem 192.168.1.20          # human-readable output
//! nullmodem dosbox.lan:23 --json  # one JSON object for a launcher
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;

use config::AppConfig;
use nullmodem_common::SessionDescriptor;

/// Two-peer session arbitration (sersetup-compatible)
#[derive(Parser, Debug)]
#[command(name = "nullmodem")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Peer address: host, host:port, or IP (overrides config)
    #[arg(env = "PEER_ADDR")]
    peer: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "config/nullmodem.toml")]
    config: String,

    /// Local bind address (overrides config)
    #[arg(short, long, env = "BIND_ADDR")]
    bind: Option<String>,

    /// Delay between announcements in milliseconds (overrides config)
    #[arg(long, env = "PACE_INTERVAL_MS")]
    interval_ms: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, default_value = "false")]
    json_logs: bool,

    /// Print the session descriptor as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine
    dotenvy::dotenv().ok();

    let args = Args::parse();

    init_logging(&args.log_level, args.json_logs)?;

    info!("Starting nullmodem v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load(&args.config, &args)?;
    let session = config
        .session_config()
        .context("Invalid configuration")?;

    let descriptor = nullmodem::arbitrate(&session)
        .await
        .with_context(|| format!("Failed to set up session with {}", session.peer_addr))?;

    print_descriptor(&descriptor, args.json)?;
    Ok(())
}

fn print_descriptor(descriptor: &SessionDescriptor<SocketAddr>, json: bool) -> Result<()> {
    if json {
        let out = serde_json::to_string(descriptor).context("Failed to serialize session")?;
        println!("{out}");
    } else {
        println!("peer:    {}", descriptor.peer());
        println!("nodes:   {}", descriptor.node_count);
        println!("players: {}", descriptor.player_count);
        println!("slot:    {}", descriptor.local_role);
    }
    Ok(())
}

/// Initialize structured logging with tracing
fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Logs go to stderr so stdout carries only the session descriptor
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
            .context("Failed to initialize logging")?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init()
            .context("Failed to initialize logging")?;
    }

    Ok(())
}

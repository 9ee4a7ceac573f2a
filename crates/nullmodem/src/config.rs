//! Configuration management for nullmodem.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use nullmodem::SessionConfig;
use nullmodem_common::NullModemError;
use nullmodem_common::constants::{DEFAULT_BIND_ADDR, DEFAULT_PACE_INTERVAL_MS, DEFAULT_PEER_PORT};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Peer address (host, host:port, or IP)
    #[serde(default)]
    pub peer_addr: Option<String>,

    /// Local bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Port assumed when the peer address has none
    #[serde(default = "default_peer_port")]
    pub default_port: u16,

    /// Delay between announcements in milliseconds
    #[serde(default = "default_pace_interval")]
    pub pace_interval_ms: u64,
}

// Default value functions
fn default_bind_addr() -> String { DEFAULT_BIND_ADDR.to_string() }
fn default_peer_port() -> u16 { DEFAULT_PEER_PORT }
fn default_pace_interval() -> u64 { DEFAULT_PACE_INTERVAL_MS }

impl AppConfig {
    /// Load configuration from file, with CLI overrides
    pub fn load(config_path: &str, args: &super::Args) -> Result<Self> {
        let mut config = Self::from_file(config_path)?;

        // Apply CLI overrides
        if let Some(ref peer) = args.peer {
            config.peer_addr = Some(peer.clone());
        }
        if let Some(ref bind) = args.bind {
            config.bind_addr = bind.clone();
        }
        if let Some(interval) = args.interval_ms {
            config.pace_interval_ms = interval;
        }

        Ok(config)
    }

    fn from_file(config_path: &str) -> Result<Self> {
        if !Path::new(config_path).exists() {
            tracing::warn!(path = %config_path, "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path))
            .build()
            .context("Failed to load config file")?;

        let config = settings
            .try_deserialize()
            .context("Failed to parse config")?;

        tracing::info!(path = %config_path, "Configuration loaded");
        Ok(config)
    }

    /// Validate and convert into session settings
    pub fn session_config(&self) -> Result<SessionConfig, NullModemError> {
        let peer_addr = match self.peer_addr.as_deref().map(str::trim) {
            Some(peer) if !peer.is_empty() => peer.to_string(),
            _ => return Err(NullModemError::Config("no peer address given".to_string())),
        };

        if self.pace_interval_ms == 0 {
            return Err(NullModemError::Config(
                "pace_interval_ms must be greater than zero".to_string(),
            ));
        }

        Ok(SessionConfig {
            bind_addr: self.bind_addr.clone(),
            peer_addr,
            default_port: self.default_port,
            pace_interval: Duration::from_millis(self.pace_interval_ms),
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            peer_addr: None,
            bind_addr: default_bind_addr(),
            default_port: default_peer_port(),
            pace_interval_ms: default_pace_interval(),
        }
    }
}

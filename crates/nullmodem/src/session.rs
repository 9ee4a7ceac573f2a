//! Session setup: bind, resolve the peer, greet it, then arbitrate.

use nullmodem_common::constants::{
    DEFAULT_BIND_ADDR, DEFAULT_PACE_INTERVAL_MS, DEFAULT_PEER_PORT, wire::HELLO,
};
use nullmodem_common::SessionDescriptor;
use nullmodem_common::error::Result;
use std::net::SocketAddr;
use std::time::Duration;

use crate::arbitrator::Arbitrator;
use crate::transport::{Transport, UdpTransport};

/// Session setup configuration
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Local bind address (e.g., "0.0.0.0:0")
    pub bind_addr: String,
    /// Peer address, "host", "host:port" or an IP literal
    pub peer_addr: String,
    /// Port used when `peer_addr` has none
    pub default_port: u16,
    /// Delay between announcements
    pub pace_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            peer_addr: String::new(),
            default_port: DEFAULT_PEER_PORT,
            pace_interval: Duration::from_millis(DEFAULT_PACE_INTERVAL_MS),
        }
    }
}

/// Open the transport and resolve the peer.
///
/// One greeting packet goes out straight away: a relay in front of the peer
/// may not open the path until it has seen traffic from us. The peer drops
/// the greeting as a malformed setup message.
pub async fn connect(config: &SessionConfig) -> Result<(UdpTransport, SocketAddr)> {
    let mut transport = UdpTransport::bind(&config.bind_addr).await?;
    let peer = transport
        .resolve(&config.peer_addr, config.default_port)
        .await?;

    if let Err(e) = transport.send(&peer, HELLO).await {
        tracing::warn!(peer = %peer, error = %e, "Failed to send greeting");
    }

    tracing::info!(
        peer = %peer,
        local = %transport.local_addr()?,
        "Connected to peer"
    );

    Ok((transport, peer))
}

/// Connect and run arbitration to completion.
///
/// Setup errors are returned before any arbitration state exists.
pub async fn arbitrate(config: &SessionConfig) -> Result<SessionDescriptor<SocketAddr>> {
    let (transport, peer) = connect(config).await?;

    let descriptor = Arbitrator::new(transport, peer)
        .with_pace_interval(config.pace_interval)
        .run()
        .await;

    Ok(descriptor)
}

//! UDP transport.
//!
//! Each setup message travels as one datagram, so the socket provides the
//! packet framing. Receives are polled with `try_recv_from` and never wait.

use nullmodem_common::NullModemError;
use nullmodem_common::error::Result;
use std::io;
use std::net::{IpAddr, SocketAddr};
use tokio::net::UdpSocket;

use super::{Datagram, Transport};

/// Receive buffer size. Larger than any valid setup message so oversized
/// packets arrive whole and are rejected by the codec.
const RECV_BUFFER_SIZE: usize = 1024;

pub struct UdpTransport {
    socket: UdpSocket,
    buf: Vec<u8>,
}

impl UdpTransport {
    /// Bind a local socket (e.g. "0.0.0.0:0")
    pub async fn bind(addr: &str) -> Result<Self> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|source| NullModemError::Bind {
                addr: addr.to_string(),
                source,
            })?;

        Ok(Self {
            socket,
            buf: vec![0u8; RECV_BUFFER_SIZE],
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Resolve a textual peer address. A bare host or IP gets `default_port`.
    /// Prefers an address of the same family as the local socket.
    pub async fn resolve(&self, address: &str, default_port: u16) -> Result<SocketAddr> {
        if let Ok(addr) = address.parse::<SocketAddr>() {
            return Ok(addr);
        }
        if let Ok(ip) = address.parse::<IpAddr>() {
            return Ok(SocketAddr::new(ip, default_port));
        }

        let has_port = address
            .rsplit_once(':')
            .is_some_and(|(_, port)| port.parse::<u16>().is_ok());

        let lookup: io::Result<Vec<SocketAddr>> = if has_port {
            tokio::net::lookup_host(address).await.map(|addrs| addrs.collect())
        } else {
            tokio::net::lookup_host((address, default_port))
                .await
                .map(|addrs| addrs.collect())
        };
        let candidates = lookup.map_err(|e| {
            tracing::debug!(address = %address, error = %e, "Lookup failed");
            NullModemError::Resolve(address.to_string())
        })?;

        let local_is_ipv4 = self.socket.local_addr().map(|a| a.is_ipv4()).unwrap_or(true);

        candidates
            .iter()
            .find(|a| a.is_ipv4() == local_is_ipv4)
            .or_else(|| candidates.first())
            .copied()
            .ok_or_else(|| NullModemError::Resolve(address.to_string()))
    }
}

impl Transport for UdpTransport {
    type Addr = SocketAddr;

    async fn send(&mut self, to: &SocketAddr, payload: &[u8]) -> io::Result<()> {
        self.socket.send_to(payload, *to).await.map(|_| ())
    }

    fn try_recv(&mut self) -> Option<Datagram<SocketAddr>> {
        match self.socket.try_recv_from(&mut self.buf) {
            Ok((len, from)) => Some(Datagram {
                from,
                payload: self.buf[..len].to_vec(),
            }),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => None,
            Err(e) => {
                // ICMP unreachable shows up here on some platforms while the
                // peer is not listening yet
                tracing::debug!(error = %e, "UDP receive error");
                None
            }
        }
    }
}

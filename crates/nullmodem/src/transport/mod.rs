//! Packet transports the arbitrator can run over.
//!
//! - `udp` - datagrams over a tokio `UdpSocket`
//! - `memory` - in-process queues for tests and simulations

mod memory;
mod udp;

use std::fmt;
use std::future::Future;
use std::io;

pub use memory::MemoryTransport;
pub use udp::UdpTransport;

/// A received packet tagged with its sender
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Datagram<A> {
    pub from: A,
    pub payload: Vec<u8>,
}

/// Narrow packet interface consumed by the arbitrator
pub trait Transport {
    /// Peer handle; compared against the sender of each inbound packet
    type Addr: Clone + PartialEq + fmt::Debug + fmt::Display;

    /// Send one packet to `to`
    fn send(&mut self, to: &Self::Addr, payload: &[u8]) -> impl Future<Output = io::Result<()>>;

    /// Take the next queued packet without waiting. `None` when the queue is empty.
    fn try_recv(&mut self) -> Option<Datagram<Self::Addr>>;
}

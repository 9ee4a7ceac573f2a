//! In-memory transport.
//!
//! Two endpoints share a pair of queues. A send lands in the other side's
//! inbox immediately, so it is visible on that side's next drain.

use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use super::{Datagram, Transport};

type Inbox = Arc<Mutex<VecDeque<Datagram<SocketAddr>>>>;

pub struct MemoryTransport {
    local_addr: SocketAddr,
    peer_addr: SocketAddr,
    inbox: Inbox,
    peer_inbox: Inbox,
    /// Drop every nth outbound packet (0 = deliver everything)
    drop_every: usize,
    sent: usize,
    dropped: usize,
}

impl MemoryTransport {
    /// Create two connected endpoints
    pub fn pair(a: SocketAddr, b: SocketAddr) -> (Self, Self) {
        let inbox_a: Inbox = Arc::default();
        let inbox_b: Inbox = Arc::default();

        let left = Self::endpoint(a, b, inbox_a.clone(), inbox_b.clone());
        let right = Self::endpoint(b, a, inbox_b, inbox_a);
        (left, right)
    }

    fn endpoint(local_addr: SocketAddr, peer_addr: SocketAddr, inbox: Inbox, peer_inbox: Inbox) -> Self {
        Self {
            local_addr,
            peer_addr,
            inbox,
            peer_inbox,
            drop_every: 0,
            sent: 0,
            dropped: 0,
        }
    }

    /// Simulate loss: every nth outbound packet vanishes
    pub fn drop_every(mut self, n: usize) -> Self {
        self.drop_every = n;
        self
    }

    /// Queue a packet as if `from` had sent it to us
    pub fn inject(&self, from: SocketAddr, payload: &[u8]) {
        lock(&self.inbox).push_back(Datagram {
            from,
            payload: payload.to_vec(),
        });
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Packets handed to `send`, including dropped ones
    pub fn sent(&self) -> usize {
        self.sent
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Packets waiting in our inbox
    pub fn pending(&self) -> usize {
        lock(&self.inbox).len()
    }
}

impl Transport for MemoryTransport {
    type Addr = SocketAddr;

    async fn send(&mut self, to: &SocketAddr, payload: &[u8]) -> io::Result<()> {
        self.sent += 1;

        if *to != self.peer_addr {
            return Err(io::Error::new(
                io::ErrorKind::HostUnreachable,
                format!("no route to {to}"),
            ));
        }

        if self.drop_every > 0 && self.sent % self.drop_every == 0 {
            self.dropped += 1;
            return Ok(());
        }

        lock(&self.peer_inbox).push_back(Datagram {
            from: self.local_addr,
            payload: payload.to_vec(),
        });
        Ok(())
    }

    fn try_recv(&mut self) -> Option<Datagram<SocketAddr>> {
        lock(&self.inbox).pop_front()
    }
}

fn lock(inbox: &Inbox) -> std::sync::MutexGuard<'_, VecDeque<Datagram<SocketAddr>>> {
    inbox.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addrs() -> (SocketAddr, SocketAddr) {
        ("10.0.0.1:2342".parse().unwrap(), "10.0.0.2:2342".parse().unwrap())
    }

    #[tokio::test]
    async fn test_pair_delivers_in_order() {
        let (a_addr, b_addr) = addrs();
        let (mut a, mut b) = MemoryTransport::pair(a_addr, b_addr);

        a.send(&b_addr, b"one").await.unwrap();
        a.send(&b_addr, b"two").await.unwrap();

        assert_eq!(b.pending(), 2);
        assert_eq!(b.try_recv().unwrap().payload, b"one");
        let second = b.try_recv().unwrap();
        assert_eq!(second.payload, b"two");
        assert_eq!(second.from, a_addr);
        assert!(b.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_drop_every_other() {
        let (a_addr, b_addr) = addrs();
        let (a, mut b) = MemoryTransport::pair(a_addr, b_addr);
        let mut a = a.drop_every(2);

        for _ in 0..6 {
            a.send(&b_addr, b"x").await.unwrap();
        }

        assert_eq!(a.sent(), 6);
        assert_eq!(a.dropped(), 3);
        assert_eq!(b.pending(), 3);
        assert!(b.try_recv().is_some());
    }

    #[tokio::test]
    async fn test_unknown_destination_fails() {
        let (a_addr, b_addr) = addrs();
        let (mut a, _b) = MemoryTransport::pair(a_addr, b_addr);
        let stranger: SocketAddr = "10.9.9.9:1".parse().unwrap();

        assert!(a.send(&stranger, b"x").await.is_err());
    }

    #[test]
    fn test_inject_tags_sender() {
        let (a_addr, b_addr) = addrs();
        let (mut a, _b) = MemoryTransport::pair(a_addr, b_addr);
        let stranger: SocketAddr = "10.9.9.9:1".parse().unwrap();

        a.inject(stranger, b"ID000001_0");
        assert_eq!(a.try_recv().unwrap().from, stranger);
    }
}

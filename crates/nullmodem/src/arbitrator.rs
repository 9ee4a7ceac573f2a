//! Session arbitration handshake.
//!
//! Both sides pick a random id and repeatedly announce `(id, stage)` to each
//! other. After every drain our stage becomes at least one past the peer's
//! last announced stage. The peer starts out as `{0, 0}`, so the first pass
//! moves us to stage 1; seeing the peer at stage 1 or later means it has
//! heard from us, and takes us to 2. Once our stage reaches 2 the two ids
//! decide the player slots: the smaller id takes slot 0.
//!
//! ```text
//! Polling (0) --first pass--> Confirming (1) --peer at 1+--> Done (2+)
//! ```
//!
//! The protocol is level-triggered: state is re-announced every interval and
//! stages only move forward, so duplicates and reordering are harmless.

use nullmodem_common::constants::{DEFAULT_PACE_INTERVAL_MS, ID_SPACE};
use nullmodem_common::{LocalIdentity, PeerIdentity, PlayerSlot, SessionDescriptor, Stage};
use rand::Rng;
use std::time::Duration;

use crate::codec;
use crate::transport::Transport;

/// Counts from one drain pass
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Valid setup messages from the peer
    pub accepted: usize,
    /// Malformed packets or packets from other senders
    pub discarded: usize,
}

/// Two-peer arbitration state machine
pub struct Arbitrator<T: Transport> {
    transport: T,
    peer: T::Addr,
    local: LocalIdentity,
    remote: PeerIdentity,
    pace_interval: Duration,
}

impl<T: Transport> Arbitrator<T> {
    /// Create an arbitrator with a freshly drawn id
    pub fn new(transport: T, peer: T::Addr) -> Self {
        let id = rand::rng().random_range(0..ID_SPACE);
        Self::with_id(transport, peer, id)
    }

    /// Create an arbitrator with a fixed id
    pub fn with_id(transport: T, peer: T::Addr, id: u32) -> Self {
        Self {
            transport,
            peer,
            local: LocalIdentity::new(id),
            remote: PeerIdentity::default(),
            pace_interval: Duration::from_millis(DEFAULT_PACE_INTERVAL_MS),
        }
    }

    /// Override the delay between announcements
    pub fn with_pace_interval(mut self, interval: Duration) -> Self {
        self.pace_interval = interval;
        self
    }

    pub fn local(&self) -> LocalIdentity {
        self.local
    }

    pub fn remote(&self) -> PeerIdentity {
        self.remote
    }

    pub fn peer(&self) -> &T::Addr {
        &self.peer
    }

    pub fn stage(&self) -> Stage {
        self.local.stage
    }

    pub fn is_done(&self) -> bool {
        self.local.stage.is_terminal()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Consume every queued packet without waiting.
    ///
    /// The last valid message from the peer wins. Anything else is dropped.
    pub fn drain(&mut self) -> DrainReport {
        let mut report = DrainReport::default();

        while let Some(datagram) = self.transport.try_recv() {
            if datagram.from != self.peer {
                tracing::debug!(from = %datagram.from, "Discarding packet from unexpected sender");
                report.discarded += 1;
                continue;
            }

            match codec::decode(&datagram.payload) {
                Ok((id, stage)) => {
                    self.remote = PeerIdentity { id, stage };
                    report.accepted += 1;
                }
                Err(e) => {
                    tracing::debug!(from = %datagram.from, error = %e, "Discarding setup packet");
                    report.discarded += 1;
                }
            }
        }

        report
    }

    /// Move past the peer's announced stage. Returns true if the stage changed.
    pub fn advance(&mut self) -> bool {
        let target = self.remote.stage.next();
        if target <= self.local.stage {
            return false;
        }

        tracing::debug!(
            from = %self.local.stage,
            to = %target,
            phase = ?target.phase(),
            peer_id = self.remote.id,
            "Arbitration stage advanced"
        );
        self.local.stage = target;
        true
    }

    /// Announce our current state to the peer
    pub async fn send(&mut self) {
        let payload = match codec::encode(self.local.id, self.local.stage) {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode setup packet");
                return;
            }
        };

        tracing::trace!(peer = %self.peer, id = self.local.id, stage = %self.local.stage, "Sending setup packet");

        if let Err(e) = self.transport.send(&self.peer, &payload).await {
            tracing::warn!(peer = %self.peer, error = %e, "Failed to send setup packet");
        }
    }

    /// One iteration without the pacing delay: drain, advance, send
    pub async fn step(&mut self) -> DrainReport {
        let report = self.drain();
        self.advance();
        self.send().await;
        report
    }

    /// The session outcome, once arbitration is complete
    pub fn outcome(&self) -> Option<SessionDescriptor<T::Addr>> {
        self.is_done().then(|| self.descriptor())
    }

    /// Run until both sides agree. Waits for the peer indefinitely.
    pub async fn run(mut self) -> SessionDescriptor<T::Addr> {
        tracing::info!(
            peer = %self.peer,
            id = self.local.id,
            interval = ?self.pace_interval,
            "Arbitration started"
        );

        while !self.is_done() {
            self.step().await;
            tokio::time::sleep(self.pace_interval).await;
        }

        let descriptor = self.descriptor();
        tracing::info!(
            peer = %self.peer,
            local_id = self.local.id,
            remote_id = self.remote.id,
            slot = %descriptor.local_role,
            "Arbitration complete"
        );
        descriptor
    }

    fn descriptor(&self) -> SessionDescriptor<T::Addr> {
        if self.local.id == self.remote.id {
            // Both sides will claim slot 1
            tracing::warn!(id = self.local.id, "Peer drew the same id");
        }

        let slot = PlayerSlot::decide(self.local.id, self.remote.id);
        SessionDescriptor::new(self.peer.clone(), slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{MemoryTransport, Transport};
    use nullmodem_common::constants::TERMINAL_STAGE;
    use std::net::SocketAddr;

    fn addr(s: &str) -> SocketAddr {
        s.parse().unwrap()
    }

    fn pair(a_id: u32, b_id: u32) -> (Arbitrator<MemoryTransport>, Arbitrator<MemoryTransport>) {
        let (a_addr, b_addr) = (addr("10.0.0.1:2342"), addr("10.0.0.2:2342"));
        let (ta, tb) = MemoryTransport::pair(a_addr, b_addr);
        (
            Arbitrator::with_id(ta, b_addr, a_id),
            Arbitrator::with_id(tb, a_addr, b_id),
        )
    }

    #[test]
    fn test_new_draws_id_in_range() {
        let (a, _) = pair(0, 0);
        let peer = *a.peer();
        let fresh = Arbitrator::new(a.transport, peer);
        assert!(fresh.local().id < ID_SPACE);
        assert_eq!(fresh.stage(), Stage::POLLING);
        assert_eq!(fresh.remote(), PeerIdentity::default());
    }

    #[test]
    fn test_drain_takes_last_valid_message() {
        let (mut a, _b) = pair(42, 7);
        let peer = *a.peer();

        a.transport().inject(peer, b"ID000007_0");
        a.transport().inject(peer, b"ID000007_1");
        let report = a.drain();

        assert_eq!(report, DrainReport { accepted: 2, discarded: 0 });
        assert_eq!(a.remote(), PeerIdentity { id: 7, stage: Stage::CONFIRMING });
    }

    #[test]
    fn test_bad_data_leaves_peer_unchanged() {
        let (mut a, _b) = pair(42, 7);
        let peer = *a.peer();

        a.transport().inject(peer, b"ID000007_1");
        a.drain();
        let before = a.remote();

        a.transport().inject(peer, b"BADDATA");
        a.transport().inject(peer, b"Hello!\0");
        let report = a.drain();

        assert_eq!(report, DrainReport { accepted: 0, discarded: 2 });
        assert_eq!(a.remote(), before);
    }

    #[test]
    fn test_foreign_sender_ignored() {
        let (mut a, _b) = pair(42, 7);

        a.transport().inject(addr("10.9.9.9:2342"), b"ID000001_1");
        let report = a.drain();

        assert_eq!(report.discarded, 1);
        assert_eq!(a.remote(), PeerIdentity::default());

        // Only the initial placeholder counts, so we stop at stage 1
        a.advance();
        assert_eq!(a.stage(), Stage::CONFIRMING);
    }

    #[test]
    fn test_stage_never_decreases() {
        let (mut a, _b) = pair(42, 7);
        let peer = *a.peer();
        let mut last = a.stage();

        for stage in [0u32, 1, 0, 3, 1, 0, 2] {
            a.transport().inject(peer, format!("ID000007_{stage}").as_bytes());
            a.drain();
            a.advance();
            assert!(a.stage() >= last);
            last = a.stage();
        }

        assert_eq!(a.stage(), Stage::new(4));
    }

    #[test]
    fn test_advance_rule() {
        let (mut a, _b) = pair(42, 7);
        let peer = *a.peer();

        // First pass with a silent peer moves past the `{0, 0}` placeholder
        assert_eq!(a.drain(), DrainReport::default());
        assert!(a.advance());
        assert_eq!(a.stage(), Stage::CONFIRMING);
        assert!(!a.advance());

        a.transport().inject(peer, b"ID000007_0");
        a.drain();
        assert!(!a.advance());
        assert_eq!(a.stage(), Stage::CONFIRMING);

        a.transport().inject(peer, b"ID000007_1");
        a.drain();
        assert!(a.advance());
        assert_eq!(a.stage().value(), TERMINAL_STAGE);
        assert!(a.is_done());
    }

    #[tokio::test]
    async fn test_send_announces_state() {
        let (mut a, mut b) = pair(42, 7);
        a.send().await;

        let datagram = b.transport_mut().try_recv().unwrap();
        assert_eq!(datagram.payload, b"ID000042_0");
    }

    #[tokio::test]
    async fn test_first_step_announces_confirming() {
        let (mut a, mut b) = pair(42, 7);
        a.step().await;

        assert_eq!(a.stage(), Stage::CONFIRMING);
        let datagram = b.transport_mut().try_recv().unwrap();
        assert_eq!(datagram.payload, b"ID000042_1");
    }

    #[tokio::test]
    async fn test_alternating_steps_survive_every_other_drop() {
        let (a_addr, b_addr) = (addr("10.0.0.1:2342"), addr("10.0.0.2:2342"));
        let (ta, tb) = MemoryTransport::pair(a_addr, b_addr);
        let mut a = Arbitrator::with_id(ta.drop_every(2), b_addr, 42);
        let mut b = Arbitrator::with_id(tb.drop_every(2), a_addr, 7);

        for _ in 0..100 {
            if !a.is_done() {
                a.step().await;
            }
            if !b.is_done() {
                b.step().await;
            }
        }

        assert!(a.is_done(), "a stuck at stage {}", a.stage());
        assert!(b.is_done(), "b stuck at stage {}", b.stage());
        assert_eq!(a.outcome().unwrap().local_role, PlayerSlot::Second);
        assert_eq!(b.outcome().unwrap().local_role, PlayerSlot::First);
    }

    #[tokio::test]
    async fn test_lockstep_convergence() {
        let (mut a, mut b) = pair(42, 7);

        let mut rounds = 0;
        while !(a.is_done() && b.is_done()) {
            rounds += 1;
            assert!(rounds <= 2, "did not converge");
            if !a.is_done() {
                a.step().await;
            }
            if !b.is_done() {
                b.step().await;
            }
        }

        let a_out = a.outcome().unwrap();
        let b_out = b.outcome().unwrap();
        assert_eq!(a_out.local_role, PlayerSlot::Second);
        assert_eq!(b_out.local_role, PlayerSlot::First);
        assert_eq!(*a_out.peer(), b.transport().local_addr());
        assert_eq!(a_out.player_count, 2);
        assert_eq!(a_out.node_count, 1);
    }

    #[test]
    fn test_outcome_requires_completion() {
        let (a, _b) = pair(42, 7);
        assert!(a.outcome().is_none());
    }

    #[test]
    fn test_equal_ids_both_take_second_slot() {
        let (mut a, mut b) = pair(5, 5);
        let (a_peer, b_peer) = (*a.peer(), *b.peer());

        a.transport().inject(a_peer, b"ID000005_1");
        b.transport().inject(b_peer, b"ID000005_1");
        a.drain();
        b.drain();
        a.advance();
        b.advance();

        assert_eq!(a.outcome().unwrap().local_role, PlayerSlot::Second);
        assert_eq!(b.outcome().unwrap().local_role, PlayerSlot::Second);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_paces_announcements() {
        let (a, b) = pair(42, 7);
        let a = a.with_pace_interval(Duration::from_millis(1000));
        let b = b.with_pace_interval(Duration::from_millis(1000));

        let start = tokio::time::Instant::now();
        let (a_out, b_out) = tokio::join!(a.run(), b.run());

        assert_eq!(a_out.local_role, PlayerSlot::Second);
        assert_eq!(b_out.local_role, PlayerSlot::First);
        assert!(start.elapsed() >= Duration::from_millis(2000));
    }
}

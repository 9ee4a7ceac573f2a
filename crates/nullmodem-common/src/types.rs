//! Core types shared across nullmodem components.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{SESSION_NODE_COUNT, SESSION_PLAYER_COUNT, TERMINAL_STAGE};

/// Handshake progress counter.
///
/// - 0: Polling (before the first drain)
/// - 1: Confirming (announcing, waiting for the peer to reach 1)
/// - 2+: Done
///
/// Values above 2 are legal: a peer that finished first may announce a
/// stage that pushes us past the terminal value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Stage(u32);

impl Stage {
    pub const POLLING: Stage = Stage(0);
    pub const CONFIRMING: Stage = Stage(1);
    pub const DONE: Stage = Stage(TERMINAL_STAGE);

    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    /// The stage one past this one (saturating)
    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Returns true once arbitration is complete
    pub fn is_terminal(&self) -> bool {
        self.0 >= TERMINAL_STAGE
    }

    pub fn phase(&self) -> Phase {
        match self.0 {
            0 => Phase::Polling,
            1 => Phase::Confirming,
            _ => Phase::Done,
        }
    }
}

impl From<u32> for Stage {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Named arbitration states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Polling,
    Confirming,
    Done,
}

/// Our own candidate id and progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalIdentity {
    pub id: u32,
    pub stage: Stage,
}

impl LocalIdentity {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            stage: Stage::POLLING,
        }
    }
}

/// Last state announced by the peer. Starts at `{0, 0}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeerIdentity {
    pub id: u32,
    pub stage: Stage,
}

/// Which player slot the local side takes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum PlayerSlot {
    /// Slot 0, the console player
    First,
    /// Slot 1
    Second,
}

impl PlayerSlot {
    /// Smaller id takes the first slot. Equal ids both land on `Second`.
    pub fn decide(local_id: u32, remote_id: u32) -> Self {
        if local_id < remote_id {
            Self::First
        } else {
            Self::Second
        }
    }

    pub fn index(&self) -> u8 {
        match self {
            Self::First => 0,
            Self::Second => 1,
        }
    }
}

impl From<PlayerSlot> for u8 {
    fn from(slot: PlayerSlot) -> Self {
        slot.index()
    }
}

impl TryFrom<u8> for PlayerSlot {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::First),
            1 => Ok(Self::Second),
            other => Err(format!("invalid player slot {other}")),
        }
    }
}

impl fmt::Display for PlayerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// Outcome of a completed arbitration, handed to the game session setup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescriptor<A> {
    /// The single resolved peer
    pub peer_addresses: [A; 1],

    /// Remote nodes in the session
    pub node_count: u8,

    /// Players in the session
    pub player_count: u8,

    /// Our slot
    pub local_role: PlayerSlot,
}

impl<A> SessionDescriptor<A> {
    pub fn new(peer: A, local_role: PlayerSlot) -> Self {
        Self {
            peer_addresses: [peer],
            node_count: SESSION_NODE_COUNT,
            player_count: SESSION_PLAYER_COUNT,
            local_role,
        }
    }

    pub fn peer(&self) -> &A {
        &self.peer_addresses[0]
    }
}

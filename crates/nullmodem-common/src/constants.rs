//! Shared constants for nullmodem components.

/// Candidate ids are drawn uniformly from `[0, ID_SPACE)`
pub const ID_SPACE: u32 = 1_000_000;

/// Largest id that fits the six-digit wire field
pub const MAX_WIRE_ID: u32 = ID_SPACE - 1;

/// Stage at which arbitration is complete
pub const TERMINAL_STAGE: u32 = 2;

/// Inbound payloads longer than this are rejected outright
pub const MAX_INBOUND_PAYLOAD: usize = 31;

/// Capacity reserved for an outbound setup message
pub const OUTBOUND_PAYLOAD_RESERVE: usize = 16;

/// Delay between re-announcements (milliseconds)
pub const DEFAULT_PACE_INTERVAL_MS: u64 = 1000;

/// Port assumed when the peer address has none
pub const DEFAULT_PEER_PORT: u16 = 2342;

/// Default local bind address (ephemeral port on all interfaces)
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:0";

/// Players in an arbitrated session
pub const SESSION_PLAYER_COUNT: u8 = 2;

/// Remote nodes in an arbitrated session
pub const SESSION_NODE_COUNT: u8 = 1;

/// Wire format pieces
pub mod wire {
    /// Literal prefix of every setup message
    pub const PREFIX: &str = "ID";

    /// Separator between the id and stage fields
    pub const SEPARATOR: char = '_';

    /// Zero-padded width of the id field
    pub const ID_WIDTH: usize = 6;

    /// Greeting sent once after connecting so relays open the path.
    /// Includes the string terminator, as the DOS side expects.
    pub const HELLO: &[u8] = b"Hello!\0";
}

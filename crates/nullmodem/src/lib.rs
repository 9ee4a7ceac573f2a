//! # Nullmodem
//!
//! Two-peer session arbitration over a packet transport. Two processes that
//! know each other's address agree that both are alive and which of them
//! takes player slot 0, with no coordinator and no shared clock.
//!
//! The setup messages are wire-compatible with `sersetup.exe`, so one side
//! can be a DOS game reached through a serial-over-IP bridge.
//!
//! ## Architecture
//! ```text
//! session::arbitrate
//!     ├── UdpTransport (bind, resolve, greet)
//!     └── Arbitrator::run
//!             └── codec (ID000042_1)
//! ```

pub mod arbitrator;
pub mod codec;
pub mod session;
pub mod transport;

pub use arbitrator::{Arbitrator, DrainReport};
pub use session::{SessionConfig, arbitrate, connect};
pub use transport::{Datagram, MemoryTransport, Transport, UdpTransport};

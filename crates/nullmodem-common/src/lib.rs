//! # Nullmodem Common
//!
//! Shared types, errors, and constants used across nullmodem components.
//!
//! ## Modules
//! - `types` - Core data structures (Stage, identities, SessionDescriptor)
//! - `error` - Common error types
//! - `constants` - Wire format and timing constants

pub mod constants;
pub mod error;
pub mod types;

pub use error::{CodecError, NullModemError};
pub use types::*;

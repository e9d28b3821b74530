//! Shared types for latticekv: the WAL record wire format, key
//! validation, and the error taxonomy. Every other crate in the
//! workspace depends on this one and nothing else depends on them.

pub mod error;
pub mod key;
pub mod record;

pub use error::{Error, Result};
pub use record::WalRecord;

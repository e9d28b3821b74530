//! Error types for latticekv.
//!
//! This module defines the error taxonomy used throughout the engine. We
//! use `thiserror` for automatic `Display`/`Error` impls, following the
//! same pattern as the rest of the storage stack.
//!
//! ### Error Categories
//!
//! - `LockHeld` — another instance owns the data directory (fatal at open)
//! - `IoError` — read/write/fsync/rename failure
//! - `BadRecord` — WAL replay hit a malformed interior line (fatal at open)
//! - `Poisoned` — the engine observed an invariant breach; mutators reject
//! - `BadArgument` — malformed request (empty key, negative top_k, ...)

use std::io;
use thiserror::Error;

/// Result type alias for latticekv operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the storage engine.
#[derive(Debug, Error)]
pub enum Error {
    /// Another instance already holds the exclusive lock on the data directory.
    #[error("data directory is locked by another instance")]
    LockHeld,

    /// Underlying I/O failure (open/read/write/fsync/rename).
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// A WAL record could not be parsed and was not the trailing line.
    #[error("corrupt WAL record: {0}")]
    BadRecord(String),

    /// Serialization/deserialization failure outside the WAL replay path.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// The engine observed an internal invariant breach and refuses further mutators.
    #[error("engine is poisoned, reopen the data directory")]
    Poisoned,

    /// A request argument failed validation.
    #[error("bad argument: {0}")]
    BadArgument(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::SerializationError(e.to_string())
    }
}

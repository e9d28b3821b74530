//! The WAL record wire format.
//!
//! A tagged union over three variants. Each record is
//! serialized as a single self-describing JSON object with an `op`
//! discriminator, one record per WAL line.

use serde::{Deserialize, Serialize};

/// A single write-ahead-log record.
///
/// `BulkSet` carries every pair of a bulk write in one record — this is
/// the entire mechanism by which bulk atomicity is obtained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum WalRecord {
    /// Insert or overwrite `key` with `value`.
    Set {
        key: String,
        value: String,
        timestamp: f64,
    },
    /// Remove `key` if present.
    Delete { key: String, timestamp: f64 },
    /// Apply every `(key, value)` pair atomically.
    BulkSet {
        operations: Vec<(String, String)>,
        timestamp: f64,
    },
}

impl WalRecord {
    /// The timestamp the record was stamped with. Informational only;
    /// recovery never sorts or dedupes by it.
    pub fn timestamp(&self) -> f64 {
        match self {
            WalRecord::Set { timestamp, .. } => *timestamp,
            WalRecord::Delete { timestamp, .. } => *timestamp,
            WalRecord::BulkSet { timestamp, .. } => *timestamp,
        }
    }
}

/// Wall-clock seconds since the Unix epoch, used to stamp WAL records.
pub fn now_secs() -> f64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

//! Durability primitives for latticekv: the instance lock, the
//! write-ahead log, and checkpoint snapshots. This crate has no notion
//! of the primary map or secondary indexes — it only knows how to make
//! bytes durable and get them back.

pub mod lock;
pub mod snapshot;
pub mod wal;

pub use lock::InstanceLock;
pub use snapshot::{load_snapshot, write_snapshot};
pub use wal::{read_records, WalWriter};

//! Crash recovery.
//!
//! Invoked once, during `Engine::open`, before the engine accepts any
//! request:
//!
//! 1. Load `data.json` into the primary map, if it exists.
//! 2. Replay `wal.log` on top of it, record by record.
//! 3. Rebuild both secondary indexes from scratch by iterating the
//!    resulting primary map.
//!
//! Recovery never writes to the WAL — truncation only ever happens
//! through the checkpointer.

use crate::primary_map::PrimaryMap;
use lattice_core::error::Error;
use lattice_core::record::WalRecord;
use lattice_durability::{load_snapshot, read_records};
use lattice_search::{EmbeddingTable, InvertedIndex};
use std::path::Path;
use tracing::info;

/// The materialized result of recovery: the primary map and both
/// secondary indexes, fully rebuilt and mutually consistent.
pub struct Recovered {
    pub primary_map: PrimaryMap,
    pub inverted_index: InvertedIndex,
    pub embeddings: EmbeddingTable,
}

/// Run the recovery procedure against `data_dir`.
pub fn recover(data_dir: &Path) -> Result<Recovered, Error> {
    let snapshot = load_snapshot(data_dir)?;
    let mut primary_map = PrimaryMap::from_entries(snapshot);

    let wal_path = data_dir.join("wal.log");
    let records = read_records(&wal_path)?;
    for record in &records {
        apply_record(&mut primary_map, record);
    }

    let mut inverted_index = InvertedIndex::new();
    let mut embeddings = EmbeddingTable::new();
    for key in primary_map.keys().cloned().collect::<Vec<_>>() {
        let value = primary_map.get(&key).expect("key just listed").clone();
        inverted_index.index(&key, &value);
        embeddings.set(&key, &value);
    }

    info!(
        keys = primary_map.len(),
        replayed_records = records.len(),
        "recovery complete"
    );

    Ok(Recovered {
        primary_map,
        inverted_index,
        embeddings,
    })
}

/// Apply one WAL record's effect to `map`, per its variant semantics:
/// Set overwrites, Delete removes-if-present, BulkSet applies all pairs
/// in order.
fn apply_record(map: &mut PrimaryMap, record: &WalRecord) {
    match record {
        WalRecord::Set { key, value, .. } => {
            map.insert(key.clone(), value.clone());
        }
        WalRecord::Delete { key, .. } => {
            map.remove(key);
        }
        WalRecord::BulkSet { operations, .. } => {
            for (key, value) in operations {
                map.insert(key.clone(), value.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lattice_durability::WalWriter;
    use tempfile::tempdir;

    #[test]
    fn replays_set_delete_and_bulk_in_order() {
        let dir = tempdir().unwrap();
        let mut wal = WalWriter::open_or_create(&dir.path().join("wal.log")).unwrap();
        wal.append(&WalRecord::Set {
            key: "a".into(),
            value: "1".into(),
            timestamp: 1.0,
        })
        .unwrap();
        wal.append(&WalRecord::Set {
            key: "a".into(),
            value: "2".into(),
            timestamp: 2.0,
        })
        .unwrap();
        wal.append(&WalRecord::BulkSet {
            operations: vec![("b".into(), "x".into()), ("c".into(), "y".into())],
            timestamp: 3.0,
        })
        .unwrap();
        wal.append(&WalRecord::Delete {
            key: "c".into(),
            timestamp: 4.0,
        })
        .unwrap();
        drop(wal);

        let recovered = recover(dir.path()).unwrap();
        assert_eq!(recovered.primary_map.get("a"), Some(&"2".to_string()));
        assert_eq!(recovered.primary_map.get("b"), Some(&"x".to_string()));
        assert_eq!(recovered.primary_map.get("c"), None);
    }

    #[test]
    fn indexes_are_rebuilt_from_the_recovered_map() {
        let dir = tempdir().unwrap();
        let mut wal = WalWriter::open_or_create(&dir.path().join("wal.log")).unwrap();
        wal.append(&WalRecord::Set {
            key: "d1".into(),
            value: "the quick brown fox".into(),
            timestamp: 1.0,
        })
        .unwrap();
        drop(wal);

        let recovered = recover(dir.path()).unwrap();
        assert_eq!(
            recovered.inverted_index.search("quick"),
            std::collections::BTreeSet::from(["d1".to_string()])
        );
        assert_eq!(recovered.embeddings.search_similar("fox", 1)[0].0, "d1");
    }

    #[test]
    fn recovery_is_idempotent_on_the_same_on_disk_state() {
        let dir = tempdir().unwrap();
        let mut wal = WalWriter::open_or_create(&dir.path().join("wal.log")).unwrap();
        wal.append(&WalRecord::Set {
            key: "a".into(),
            value: "1".into(),
            timestamp: 1.0,
        })
        .unwrap();
        drop(wal);

        let first = recover(dir.path()).unwrap();
        let second = recover(dir.path()).unwrap();
        assert_eq!(first.primary_map.snapshot(), second.primary_map.snapshot());
    }
}

//! The engine facade: the public operations, recovery
//! orchestration, and the single exclusive guard that serializes every
//! mutator and reader.
//!
//! Control flow for a mutation: acquire the guard → append+fsync the
//! WAL record → update the primary map → update the secondary indexes →
//! optionally checkpoint → release the guard → return success. A
//! mutation is acknowledged only after the WAL fsync returns.

use crate::primary_map::PrimaryMap;
use crate::recovery::recover;
use lattice_core::error::Error;
use lattice_core::key::validate_key;
use lattice_core::record::{now_secs, WalRecord};
use lattice_durability::{write_snapshot, InstanceLock, WalWriter};
use lattice_search::{EmbeddingTable, InvertedIndex};
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// How often the engine collapses the WAL into a fresh `data.json`
/// snapshot. The WAL is always the durability boundary; this is purely
/// a performance knob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointPolicy {
    /// Checkpoint after every mutation. Simplest and safest; the WAL is
    /// truncated as often as possible.
    EveryMutation,
    /// Checkpoint after every `n` mutations.
    EveryN(u64),
    /// Never checkpoint automatically; only `Engine::checkpoint` and
    /// `Engine::close` do so.
    Never,
}

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// When set, every checkpoint attempt has a 1% chance of skipping
    /// the snapshot write, as a pseudo-failure injection hook for
    /// exercising WAL-only recovery paths in tests. Never affects WAL
    /// fsync. Default off.
    pub debug: bool,
    /// Checkpoint batching policy. Default `EveryMutation`.
    pub checkpoint_policy: CheckpointPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debug: false,
            checkpoint_policy: CheckpointPolicy::EveryMutation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    Ready,
    Poisoned,
}

struct Guarded {
    state: EngineState,
    primary_map: PrimaryMap,
    inverted_index: InvertedIndex,
    embeddings: EmbeddingTable,
    wal: WalWriter,
    mutations_since_checkpoint: u64,
}

/// The storage engine: one instance per data directory, for the
/// lifetime of the process (or until `close`/drop).
pub struct Engine {
    data_dir: PathBuf,
    config: EngineConfig,
    // Held for the engine's lifetime; released on drop. Not locked
    // alongside `guarded` because it never needs re-acquiring.
    _lock: InstanceLock,
    guarded: Mutex<Guarded>,
}

impl Engine {
    /// Open (or create) the store at `data_dir`, running recovery
    /// before returning. Fails with `Error::LockHeld` if another
    /// instance already owns the directory, or `Error::BadRecord` if
    /// the WAL contains an interior malformed record.
    pub fn open(data_dir: impl AsRef<Path>, config: EngineConfig) -> Result<Self, Error> {
        let data_dir = data_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_dir)?;

        let lock = InstanceLock::acquire(&data_dir)?;

        let recovered = recover(&data_dir)?;
        let wal = WalWriter::open_or_create(&data_dir.join("wal.log"))?;

        info!(path = %data_dir.display(), keys = recovered.primary_map.len(), "engine ready");

        Ok(Self {
            data_dir,
            config,
            _lock: lock,
            guarded: Mutex::new(Guarded {
                state: EngineState::Ready,
                primary_map: recovered.primary_map,
                inverted_index: recovered.inverted_index,
                embeddings: recovered.embeddings,
                wal,
                mutations_since_checkpoint: 0,
            }),
        })
    }

    /// Insert or overwrite `key` with `value`.
    pub fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        validate_key(key)?;
        let mut guard = self.guarded.lock();
        ensure_ready(&guard)?;

        let record = WalRecord::Set {
            key: key.to_string(),
            value: value.to_string(),
            timestamp: now_secs(),
        };
        guard.wal.append(&record)?;

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            guard.primary_map.insert(key.to_string(), value.to_string());
            guard.inverted_index.index(key, value);
            guard.embeddings.set(key, value);
        }));
        if outcome.is_err() {
            guard.state = EngineState::Poisoned;
            return Err(Error::Poisoned);
        }
        guard.mutations_since_checkpoint += 1;

        self.maybe_checkpoint(&mut guard)
    }

    /// Current value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<String> {
        let guard = self.guarded.lock();
        guard.primary_map.get(key).cloned()
    }

    /// Remove `key`. Returns whether it was present. Absent keys are a
    /// no-op and emit no WAL record.
    pub fn delete(&self, key: &str) -> Result<bool, Error> {
        validate_key(key)?;
        let mut guard = self.guarded.lock();
        ensure_ready(&guard)?;

        if guard.primary_map.get(key).is_none() {
            return Ok(false);
        }

        let record = WalRecord::Delete {
            key: key.to_string(),
            timestamp: now_secs(),
        };
        guard.wal.append(&record)?;

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            guard.primary_map.remove(key);
            guard.inverted_index.remove(key);
            guard.embeddings.remove(key);
        }));
        if outcome.is_err() {
            guard.state = EngineState::Poisoned;
            return Err(Error::Poisoned);
        }
        guard.mutations_since_checkpoint += 1;

        self.maybe_checkpoint(&mut guard)?;
        Ok(true)
    }

    /// Apply every pair atomically: one WAL record covers the whole
    /// group, so after recovery either every pair is present or none
    /// are.
    pub fn bulk_set(&self, pairs: &[(String, String)]) -> Result<(), Error> {
        for (key, _) in pairs {
            validate_key(key)?;
        }
        let mut guard = self.guarded.lock();
        ensure_ready(&guard)?;

        let record = WalRecord::BulkSet {
            operations: pairs.to_vec(),
            timestamp: now_secs(),
        };
        guard.wal.append(&record)?;

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            for (key, value) in pairs {
                guard.primary_map.insert(key.clone(), value.clone());
                guard.inverted_index.index(key, value);
                guard.embeddings.set(key, value);
            }
        }));
        if outcome.is_err() {
            guard.state = EngineState::Poisoned;
            return Err(Error::Poisoned);
        }
        guard.mutations_since_checkpoint += 1;

        self.maybe_checkpoint(&mut guard)
    }

    /// Keys whose current value contains every token of `query`
    /// (lowercased, whitespace-split). Empty or unmatched queries yield
    /// an empty set.
    pub fn search_text(&self, query: &str) -> BTreeSet<String> {
        let guard = self.guarded.lock();
        guard.inverted_index.search(query)
    }

    /// Rank every key by cosine similarity of its embedding to `query`'s
    /// embedding, descending, and return the top `top_k`.
    pub fn search_similar(&self, query: &str, top_k: i64) -> Result<Vec<(String, f64)>, Error> {
        if top_k < 0 {
            return Err(Error::BadArgument("top_k must be non-negative".into()));
        }
        let guard = self.guarded.lock();
        Ok(guard.embeddings.search_similar(query, top_k as usize))
    }

    /// Every key currently in the primary map.
    pub fn get_all_keys(&self) -> BTreeSet<String> {
        let guard = self.guarded.lock();
        guard.primary_map.keys().cloned().collect()
    }

    /// Force a checkpoint regardless of the configured policy. Still
    /// subject to the debug pseudo-failure hook.
    pub fn checkpoint(&self) -> Result<(), Error> {
        let mut guard = self.guarded.lock();
        ensure_ready(&guard)?;
        self.do_checkpoint(&mut guard)
    }

    /// Close the engine: perform a final checkpoint (the legal minimum
    /// for a clean shutdown) and release the instance lock. Consumes the
    /// engine; a crash that never reaches this point is recovered from
    /// the WAL on next open instead.
    pub fn close(self) -> Result<(), Error> {
        let mut guard = self.guarded.lock();
        if guard.state == EngineState::Ready {
            self.do_checkpoint(&mut guard)?;
        }
        Ok(())
    }

    fn maybe_checkpoint(&self, guard: &mut Guarded) -> Result<(), Error> {
        let should = match self.config.checkpoint_policy {
            CheckpointPolicy::EveryMutation => true,
            CheckpointPolicy::EveryN(n) => guard.mutations_since_checkpoint >= n,
            CheckpointPolicy::Never => false,
        };
        if should {
            self.do_checkpoint(guard)?;
        }
        Ok(())
    }

    fn do_checkpoint(&self, guard: &mut Guarded) -> Result<(), Error> {
        if self.config.debug && rand::random::<f64>() < 0.01 {
            warn!("debug pseudo-failure: skipping this checkpoint's snapshot write");
            return Ok(());
        }
        write_snapshot(&self.data_dir, &guard.primary_map.snapshot())?;
        guard.wal.truncate()?;
        guard.mutations_since_checkpoint = 0;
        Ok(())
    }
}

fn ensure_ready(guard: &Guarded) -> Result<(), Error> {
    match guard.state {
        EngineState::Ready => Ok(()),
        EngineState::Poisoned => Err(Error::Poisoned),
    }
}

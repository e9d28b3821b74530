//! Checkpoint snapshots.
//!
//! A snapshot is a single JSON object mapping key → value over the
//! complete primary map, written via the write-fsync-rename pattern so
//! that at most one snapshot file ever exists at rest and readers never
//! observe a partial one.

use lattice_core::error::Error;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Atomically write `map` to `<data_dir>/data.json`.
///
/// 1. Serialize to `data.json.tmp`.
/// 2. Flush and fsync the temp file.
/// 3. Rename `data.json.tmp` → `data.json`, replacing any prior snapshot.
pub fn write_snapshot(data_dir: &Path, map: &HashMap<String, String>) -> Result<(), Error> {
    let tmp_path = data_dir.join("data.json.tmp");
    let final_path = data_dir.join("data.json");

    let mut file = File::create(&tmp_path)?;
    let bytes = serde_json::to_vec(map)?;
    file.write_all(&bytes)?;
    file.flush()?;
    file.sync_all()?;
    drop(file);

    fs::rename(&tmp_path, &final_path)?;
    info!(keys = map.len(), path = %final_path.display(), "wrote checkpoint snapshot");
    Ok(())
}

/// Load `<data_dir>/data.json` if it exists, otherwise an empty map.
pub fn load_snapshot(data_dir: &Path) -> Result<HashMap<String, String>, Error> {
    let path = data_dir.join("data.json");
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let bytes = fs::read(&path)?;
    let map = serde_json::from_slice(&bytes)?;
    Ok(map)
}

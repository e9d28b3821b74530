//! The write-ahead log.
//!
//! `wal.log` is append-only between truncations. A write is durable once
//! its bytes have been appended, flushed, and fsync'd — only then may the
//! engine mutate in-memory state and acknowledge the caller. A `BulkSet`
//! with N pairs is exactly one record, which is the entire mechanism by
//! which bulk atomicity is obtained.

use lattice_core::error::Error;
use lattice_core::record::WalRecord;
use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Append-only writer for `wal.log`.
pub struct WalWriter {
    file: File,
    path: PathBuf,
}

impl WalWriter {
    /// Open (creating if absent) the WAL file for appending.
    pub fn open_or_create(path: &Path) -> Result<Self, Error> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Append a record: serialize to one line, write, flush, and fsync.
    /// Only after this returns may the caller mutate in-memory state.
    pub fn append(&mut self, record: &WalRecord) -> Result<(), Error> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        self.file.write_all(line.as_bytes())?;
        self.file.flush()?;
        self.file.sync_all()?;
        Ok(())
    }

    /// Truncate the WAL to empty. Only ever called by the checkpointer,
    /// after the snapshot that covers these records has been durably
    /// renamed into place.
    pub fn truncate(&mut self) -> Result<(), Error> {
        self.file.set_len(0)?;
        self.file.seek(SeekFrom::Start(0))?;
        self.file.sync_all()?;
        Ok(())
    }

    /// Path of the underlying WAL file, for diagnostics.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Scan `wal.log` line by line and return the well-formed records in
/// order.
///
/// A malformed *trailing* line (the tail end of a write that was cut off
/// by a crash) is tolerated: replay stops there and those bytes are
/// discarded. A malformed *interior* line — one followed by more
/// well-formed records — indicates corruption and is a recovery failure.
///
/// The file is split on raw `\n` bytes rather than read through
/// `BufRead::lines`, which treats invalid UTF-8 as an I/O error: a crash
/// can tear a write in the middle of a multi-byte UTF-8 character in a
/// value, and that torn trailing line must be tolerated exactly like a
/// torn trailing line that happens to decode but fails to parse as JSON.
pub fn read_records(path: &Path) -> Result<Vec<WalRecord>, Error> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let bytes = fs::read(path)?;
    let mut lines: Vec<&[u8]> = bytes.split(|&b| b == b'\n').collect();
    if lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    let last_index = lines.len().checked_sub(1);

    let mut records = Vec::with_capacity(lines.len());
    for (i, line) in lines.iter().enumerate() {
        if line.iter().all(|&b| b.is_ascii_whitespace()) {
            continue;
        }
        let parsed = std::str::from_utf8(line)
            .map_err(|e| e.to_string())
            .and_then(|s| serde_json::from_str::<WalRecord>(s).map_err(|e| e.to_string()));
        match parsed {
            Ok(record) => records.push(record),
            Err(e) => {
                if Some(i) == last_index {
                    warn!(line = i + 1, "discarding malformed trailing WAL line");
                    break;
                }
                return Err(Error::BadRecord(format!("line {}: {e}", i + 1)));
            }
        }
    }
    Ok(records)
}

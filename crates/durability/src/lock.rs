//! Advisory exclusive lock on the data directory.
//!
//! `store.lock` is the sole mutual-exclusion token between instances: two
//! engines pointed at the same directory must never both reach `Ready`.
//! The lock is held for the lifetime of the `InstanceLock` value and
//! released (and the handle closed) on drop.

use fs2::FileExt;
use lattice_core::error::Error;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use tracing::{debug, warn};

/// A held, process-lifetime advisory lock on `<data_dir>/store.lock`.
pub struct InstanceLock {
    file: File,
}

impl InstanceLock {
    /// Create-or-open `store.lock` and attempt a non-blocking exclusive
    /// lock. Fails fast with `Error::LockHeld` if another instance
    /// already holds it.
    pub fn acquire(data_dir: &Path) -> Result<Self, Error> {
        let path = data_dir.join("store.lock");
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&path)?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                debug!(path = %path.display(), "acquired instance lock");
                Ok(Self { file })
            }
            Err(e) if is_lock_contended(&e) => {
                warn!(path = %path.display(), "data directory already locked");
                Err(Error::LockHeld)
            }
            Err(e) => Err(Error::IoError(e)),
        }
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

fn is_lock_contended(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::PermissionDenied
    )
}

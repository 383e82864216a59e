//! Import mutual exclusion: a TTL-stamped lock file under the XDG state dir.
//!
//! At most one import may run at a time. The lock expires after `ttl_secs`,
//! so a run that died without releasing cannot wedge later imports.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// Default lock lifetime: 10 minutes.
pub const DEFAULT_LOCK_TTL_SECS: u64 = 600;

/// On-disk snapshot of a held lock.
#[derive(Debug, Serialize, Deserialize)]
struct LockSnapshot {
    acquired_at: i64,
    pid: u32,
}

/// Named mutual-exclusion token for import runs.
pub struct ImportLock {
    path: PathBuf,
    ttl_secs: u64,
}

impl ImportLock {
    /// Default lock path: `~/.local/state/rim/import.lock`.
    pub fn default_path() -> Result<PathBuf> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("rim")?;
        Ok(xdg_dirs.get_state_home().join("import.lock"))
    }

    pub fn new(path: PathBuf, ttl_secs: u64) -> Self {
        ImportLock { path, ttl_secs }
    }

    /// Try to take the lock. Returns `None` when a live (non-expired) lock
    /// file already exists.
    pub fn acquire(&self) -> Result<Option<LockGuard>> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create dir: {}", parent.display()))?;
        }

        if let Some(guard) = self.try_create()? {
            return Ok(Some(guard));
        }
        if !self.is_stale() {
            return Ok(None);
        }

        // Expired leftover from a run that died without releasing.
        tracing::warn!("removing stale lock file {}", self.path.display());
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                return Err(e)
                    .with_context(|| format!("remove stale lock: {}", self.path.display()));
            }
        }
        // A concurrent acquirer may win the re-create; that counts as held.
        self.try_create()
    }

    fn try_create(&self) -> Result<Option<LockGuard>> {
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(mut file) => {
                let snapshot = LockSnapshot {
                    acquired_at: unix_timestamp(),
                    pid: std::process::id(),
                };
                let json =
                    serde_json::to_string(&snapshot).context("serialize lock snapshot")?;
                file.write_all(json.as_bytes())
                    .with_context(|| format!("write lock file: {}", self.path.display()))?;
                Ok(Some(LockGuard {
                    path: self.path.clone(),
                }))
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(None),
            Err(e) => {
                Err(e).with_context(|| format!("create lock file: {}", self.path.display()))
            }
        }
    }

    /// Whether the lock file on disk has outlived its TTL. Unreadable
    /// leftovers never block future imports.
    fn is_stale(&self) -> bool {
        let bytes = match fs::read(&self.path) {
            Ok(b) => b,
            // Vanished between the create attempt and now; treat as free.
            Err(_) => return true,
        };
        match serde_json::from_slice::<LockSnapshot>(&bytes) {
            Ok(snapshot) => unix_timestamp() - snapshot.acquired_at >= self.ttl_secs as i64,
            Err(_) => true,
        }
    }
}

/// Releases the lock file when dropped, on every exit path.
pub struct LockGuard {
    path: PathBuf,
}

impl LockGuard {
    /// Explicit release; equivalent to dropping the guard.
    pub fn release(self) {}
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!("could not remove lock file {}: {}", self.path.display(), e);
        }
    }
}

fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

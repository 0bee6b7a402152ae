//! Exclusive lock files guarding JSONL-backed graph handles.
//!
//! A lock file records the holder as `pid=<n>` and `utc=<rfc3339>` lines. A
//! lock whose holder process is gone is treated as stale and replaced.

use chrono::Utc;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

pub fn store_lock_path(store_path: &Path) -> PathBuf {
    let mut path: OsString = store_path.as_os_str().to_os_string();
    path.push(".lock");
    PathBuf::from(path)
}

#[derive(Debug, thiserror::Error)]
pub enum LockFileError {
    #[error("graph store lock busy: {lock_path}")]
    Busy { lock_path: String },

    #[error("failed to acquire graph store lock {lock_path}: {message}")]
    Io { lock_path: String, message: String },
}

impl LockFileError {
    fn busy(lock_path: &Path) -> Self {
        Self::Busy {
            lock_path: lock_path.display().to_string(),
        }
    }

    fn io(lock_path: &Path, message: impl Into<String>) -> Self {
        Self::Io {
            lock_path: lock_path.display().to_string(),
            message: message.into(),
        }
    }
}

/// Held for the lifetime of one store handle; the lock file is removed on drop.
#[derive(Debug)]
pub struct StoreFileLock {
    lock_path: PathBuf,
    _file: File,
}

impl StoreFileLock {
    pub fn acquire(store_path: &Path) -> Result<Self, LockFileError> {
        let lock_path = store_lock_path(store_path);
        if let Some(parent) = lock_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| LockFileError::io(&lock_path, e.to_string()))?;
        }

        match Self::create(&lock_path) {
            Err(busy @ LockFileError::Busy { .. }) => {
                let Some(pid) = stale_holder(&lock_path) else {
                    return Err(busy);
                };
                warn!(lock_path = %lock_path.display(), pid, "replacing stale graph store lock");
                match fs::remove_file(&lock_path) {
                    Ok(()) => {}
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => return Err(LockFileError::io(&lock_path, e.to_string())),
                }
                Self::create(&lock_path)
            }
            other => other,
        }
    }

    fn create(lock_path: &Path) -> Result<Self, LockFileError> {
        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(lock_path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(LockFileError::busy(lock_path));
            }
            Err(e) => return Err(LockFileError::io(lock_path, e.to_string())),
        };
        writeln!(
            file,
            "pid={}\nutc={}",
            std::process::id(),
            Utc::now().to_rfc3339()
        )
        .map_err(|e| LockFileError::io(lock_path, e.to_string()))?;
        Ok(Self {
            lock_path: lock_path.to_path_buf(),
            _file: file,
        })
    }

    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }
}

impl Drop for StoreFileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

/// The recorded holder pid, if that process no longer exists.
///
/// Unreadable files, files without a `pid=` line and locks held by this
/// process are never stale.
fn stale_holder(lock_path: &Path) -> Option<u32> {
    let text = fs::read_to_string(lock_path).ok()?;
    let pid = text
        .lines()
        .find_map(|line| line.strip_prefix("pid="))?
        .trim()
        .parse::<u32>()
        .ok()?;
    if pid == std::process::id() || process_is_running(pid) {
        return None;
    }
    Some(pid)
}

#[cfg(target_os = "linux")]
fn process_is_running(pid: u32) -> bool {
    Path::new("/proc").join(pid.to_string()).exists()
}

// No portable liveness check elsewhere; keep the lock.
#[cfg(not(target_os = "linux"))]
fn process_is_running(_pid: u32) -> bool {
    true
}

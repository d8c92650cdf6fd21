//! Filesystem-based locking for cross-process coordination
//!
//! At most one build may run against a given index location at a time; an
//! flock()-held lock file enforces that across processes. If the process
//! crashes, the OS releases the lock.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{self, File};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Get the directory for lock files
fn lock_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("review-rag")
        .join("locks")
}

/// Get the lock file path for a given normalized root path
fn lock_file_path(normalized_path: &str) -> PathBuf {
    lock_dir().join(format!("{}.lock", crate::paths::root_id(normalized_path)))
}

/// Guard that holds an exclusive filesystem lock
///
/// The lock is released when this guard is dropped.
pub struct FsLockGuard {
    _file: File,
    _path: PathBuf,
}

impl FsLockGuard {
    /// Try to acquire an exclusive filesystem lock, non-blocking
    ///
    /// Returns:
    /// - `Ok(Some(guard))` if the lock was acquired
    /// - `Ok(None)` if another process holds the lock
    /// - `Err(...)` on IO errors
    pub fn try_acquire(normalized_path: &str) -> Result<Option<Self>> {
        let lock_path = lock_file_path(normalized_path);

        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent).context("Failed to create lock directory")?;
        }

        let file = File::create(&lock_path).context("Failed to create lock file")?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                tracing::debug!(
                    "Acquired filesystem lock for: {} (lock_file={:?})",
                    normalized_path,
                    lock_path
                );
                Ok(Some(Self {
                    _file: file,
                    _path: lock_path,
                }))
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                tracing::debug!(
                    "Filesystem lock blocked (another holder) for: {}",
                    normalized_path
                );
                Ok(None)
            }
            Err(e) => Err(e).context("Failed to acquire filesystem lock"),
        }
    }

    /// Acquire lock, blocking until available (with timeout)
    ///
    /// Polls until the lock is acquired (`Ok(Some(guard))`), the timeout
    /// expires (`Ok(None)`), or an IO error occurs.
    pub fn acquire_blocking(normalized_path: &str, timeout: Duration) -> Result<Option<Self>> {
        let start = Instant::now();
        let sleep_interval = Duration::from_millis(500);

        loop {
            match Self::try_acquire(normalized_path)? {
                Some(guard) => return Ok(Some(guard)),
                None => {
                    if start.elapsed() >= timeout {
                        tracing::warn!(
                            "Timeout waiting for filesystem lock on {} after {:?}",
                            normalized_path,
                            timeout
                        );
                        return Ok(None);
                    }
                    std::thread::sleep(sleep_interval);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_acquire_and_release() {
        let path = "/test/path/for/locking";

        let guard = FsLockGuard::try_acquire(path).unwrap();
        assert!(guard.is_some());

        drop(guard);

        let guard2 = FsLockGuard::try_acquire(path).unwrap();
        assert!(guard2.is_some());
    }

    #[test]
    fn test_concurrent_lock_fails() {
        let path = "/test/path/for/concurrent/locking";

        let guard1 = FsLockGuard::try_acquire(path).unwrap();
        assert!(guard1.is_some());

        let path_clone = path.to_string();
        let handle = thread::spawn(move || FsLockGuard::try_acquire(&path_clone).unwrap());

        let result = handle.join().unwrap();
        assert!(result.is_none(), "Second lock should fail");

        drop(guard1);

        let guard2 = FsLockGuard::try_acquire(path).unwrap();
        assert!(guard2.is_some());
    }

    #[test]
    fn test_blocking_acquire_with_timeout() {
        let path = "/test/path/for/blocking/timeout";

        let _guard = FsLockGuard::try_acquire(path).unwrap().unwrap();

        let path_clone = path.to_string();
        let handle = thread::spawn(move || {
            FsLockGuard::acquire_blocking(&path_clone, Duration::from_millis(100)).unwrap()
        });

        let result = handle.join().unwrap();
        assert!(result.is_none(), "Should timeout waiting for lock");
    }

    #[test]
    fn test_lock_file_path_uniqueness() {
        let lock1 = lock_file_path("/path/to/project1");
        let lock2 = lock_file_path("/path/to/project2");
        let lock1_dup = lock_file_path("/path/to/project1");

        assert_ne!(lock1, lock2);
        assert_eq!(lock1, lock1_dup);
    }
}

//! Advisory file locks coordinating processes that share one snapshot
//!
//! Every process opening the same snapshot path takes a shared lock on
//! `<snapshot>.lock` while reloading and an exclusive one while writing.
//! Schedule runs are claimed with a non-blocking exclusive lock on
//! `<snapshot>.<schedule id>.run.lock`. On non-unix targets the file locks
//! are no-ops and only the in-process lease set applies.

use std::collections::HashSet;
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::errors::{SharedError, SharedResult};
use crate::types::ScheduleId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LockMode {
    Shared,
    Exclusive,
}

/// A held lock on a sibling file of the snapshot; released on drop
pub(crate) struct FileLock {
    #[cfg(unix)]
    _flock: nix::fcntl::Flock<File>,
    #[cfg(not(unix))]
    _file: File,
}

impl FileLock {
    /// Block (off the async runtime) until the lock is granted
    pub async fn acquire(path: PathBuf, mode: LockMode) -> SharedResult<Self> {
        tokio::task::spawn_blocking(move || Self::lock(&path, mode, true))
            .await
            .map_err(|e| SharedError::storage("lock snapshot", e.to_string()))?
            .and_then(|lock| lock.ok_or_else(|| SharedError::storage("lock snapshot", "lock not granted")))
    }

    /// Exclusive lock if nobody holds one; `None` when it is taken
    pub fn try_exclusive(path: &Path) -> SharedResult<Option<Self>> {
        Self::lock(path, LockMode::Exclusive, false)
    }

    #[cfg(unix)]
    fn lock(path: &Path, mode: LockMode, blocking: bool) -> SharedResult<Option<Self>> {
        use nix::errno::Errno;
        use nix::fcntl::{Flock, FlockArg};

        let file = open_lock_file(path)?;
        let arg = match (mode, blocking) {
            (LockMode::Shared, true) => FlockArg::LockShared,
            (LockMode::Shared, false) => FlockArg::LockSharedNonblock,
            (LockMode::Exclusive, true) => FlockArg::LockExclusive,
            (LockMode::Exclusive, false) => FlockArg::LockExclusiveNonblock,
        };
        match Flock::lock(file, arg) {
            Ok(flock) => Ok(Some(Self { _flock: flock })),
            Err((_, Errno::EWOULDBLOCK)) if !blocking => Ok(None),
            Err((_, errno)) => Err(SharedError::storage(
                format!("lock {}", path.display()),
                errno.desc(),
            )),
        }
    }

    #[cfg(not(unix))]
    fn lock(path: &Path, _mode: LockMode, _blocking: bool) -> SharedResult<Option<Self>> {
        Ok(Some(Self {
            _file: open_lock_file(path)?,
        }))
    }
}

fn open_lock_file(path: &Path) -> SharedResult<File> {
    OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)
        .map_err(|e| SharedError::storage(format!("open {}", path.display()), e.to_string()))
}

/// `<snapshot><suffix>` next to the snapshot file
pub(crate) fn sibling(snapshot: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(snapshot.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Exclusive claim on running one schedule, released when dropped
///
/// Held by the scheduler for the whole run, so a second scheduler over the
/// same store (another process included) cannot start the schedule meanwhile.
pub struct RunLease {
    schedule_id: ScheduleId,
    active: Arc<Mutex<HashSet<ScheduleId>>>,
    _file: Option<FileLock>,
}

impl RunLease {
    pub(crate) fn try_acquire(
        schedule_id: ScheduleId,
        active: &Arc<Mutex<HashSet<ScheduleId>>>,
        lock_path: Option<PathBuf>,
    ) -> SharedResult<Option<Self>> {
        let mut held = active.lock().unwrap_or_else(|e| e.into_inner());
        if held.contains(&schedule_id) {
            return Ok(None);
        }

        let file = match lock_path {
            Some(path) => match FileLock::try_exclusive(&path)? {
                Some(lock) => Some(lock),
                None => {
                    debug!("Schedule {} is being run by another process", schedule_id);
                    return Ok(None);
                }
            },
            None => None,
        };

        held.insert(schedule_id);
        Ok(Some(Self {
            schedule_id,
            active: active.clone(),
            _file: file,
        }))
    }

    pub fn schedule_id(&self) -> ScheduleId {
        self.schedule_id
    }
}

impl std::fmt::Debug for RunLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunLease").field("schedule_id", &self.schedule_id).finish()
    }
}

impl Drop for RunLease {
    fn drop(&mut self) {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.schedule_id);
    }
}

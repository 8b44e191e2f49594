//! File-backed single-flight latch shared between the hook process and the
//! popup helper.
//!
//! The helper is the only writer: it creates `<dir>/<group>.lock` when it
//! starts and removes it when it closes. The hook process only reads it, and
//! treats it as advisory: a marker older than the staleness ceiling, or one
//! whose recorded pid is gone, is removed and ignored.

use crate::notification::sanitize_id;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct LockStore {
    dir: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LockRecord {
    pid: Option<u32>,
    created: Option<u64>,
}

impl LockStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, group: &str) -> PathBuf {
        let mut name = sanitize_id(group);
        if name.is_empty() {
            name = "default".to_string();
        }
        self.dir.join(format!("{name}.lock"))
    }

    /// Whether a live popup holds the lock for `group`. Stale markers are
    /// cleared as a side effect.
    pub fn is_held(&self, group: &str, max_age: Duration) -> bool {
        let path = self.path_for(group);
        let Ok(contents) = fs::read_to_string(&path) else {
            return false;
        };
        let record = parse_record(&contents);
        let created = record.created.or_else(|| modified_secs(&path));
        let age = created.map(|c| now_secs().saturating_sub(c));

        let expired = age.map(|a| a > max_age.as_secs()).unwrap_or(true);
        let orphaned = record.pid.map(|pid| !process_alive(pid)).unwrap_or(false);
        if expired || orphaned {
            debug!(path = %path.display(), expired, orphaned, "clearing stale interaction lock");
            let _ = fs::remove_file(&path);
            return false;
        }
        true
    }
}

/// Marker owned by a running popup helper.
#[derive(Debug)]
pub struct InteractionLock {
    path: PathBuf,
    released: bool,
}

impl InteractionLock {
    pub fn acquire(path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = format!("{}\n{}\n", std::process::id(), now_secs());
        fs::write(path, contents)?;
        Ok(Self {
            path: path.to_path_buf(),
            released: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(err) = fs::remove_file(&self.path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), %err, "failed to remove interaction lock");
            }
        }
    }
}

impl Drop for InteractionLock {
    fn drop(&mut self) {
        self.release();
    }
}

fn parse_record(contents: &str) -> LockRecord {
    let mut lines = contents.lines().map(str::trim);
    LockRecord {
        pid: lines.next().and_then(|l| l.parse().ok()),
        created: lines.next().and_then(|l| l.parse().ok()),
    }
}

fn modified_secs(path: &Path) -> Option<u64> {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn process_alive(pid: u32) -> bool {
    #[cfg(unix)]
    {
        let Ok(pid) = libc::pid_t::try_from(pid) else {
            return false;
        };
        // Signal 0 only checks for existence; EPERM still means it exists.
        let rc = unsafe { libc::kill(pid, 0) };
        if rc == 0 {
            return true;
        }
        std::io::Error::last_os_error().raw_os_error() != Some(libc::ESRCH)
    }
    #[cfg(not(unix))]
    {
        let _ = pid;
        true
    }
}

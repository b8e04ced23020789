//! Bounded snapshot storage.
//!
//! Owns a single flat directory of heap snapshot files and keeps it within
//! quota:
//! - LRU eviction by modification time on every allocation
//! - emergency full clear when the volume runs short on free space
//! - age-based sweep for the periodic maintenance trigger
//!
//! The directory listing is the only index; there is no sidecar state. The
//! store never writes snapshot bytes itself — `allocate` only reserves a
//! fresh path and the inspector fills it in.
//!
//! Concurrency caveat: the LRU pass is read-then-delete without a lock, so
//! the file count quota is exact only under serialized allocation. Concurrent
//! allocators converge back to quota on their next allocation.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Local};
use serde::Serialize;
use thiserror::Error;

use crate::config::Config;

/// File extension for stored snapshots.
pub const SNAPSHOT_EXT: &str = "hprof";

/// A reserved slot in the store. The path does not exist on disk yet;
/// whoever requested the slot owns the file until it deletes it.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    pub path: PathBuf,
    pub process_label: String,
    pub process_id: u32,
    pub created_at: DateTime<Local>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// The storage directory could not be created or is not writable.
    /// Fatal to this allocation only, never to the process.
    #[error("storage directory not writable: {0}")]
    NotWritable(String),

    /// Free space stayed below the configured floor even after LRU eviction
    /// and an emergency full clear. No snapshot should be attempted.
    #[error("insufficient free space: {free} bytes free, {required} required")]
    NoSpace { free: u64, required: u64 },
}

/// Outcome of an `evict_expired` sweep, for the maintenance caller.
#[derive(Debug, Default, Serialize)]
pub struct SweepSummary {
    pub deleted_files: usize,
    pub deleted_bytes: u64,
    pub errors: Vec<String>,
}

/// One stored snapshot as reported by `status`.
#[derive(Debug, Serialize)]
pub struct StoredDump {
    pub name: String,
    pub size_bytes: u64,
    pub age_secs: u64,
}

#[derive(Debug, Serialize)]
pub struct StoreStatus {
    pub root: PathBuf,
    pub entries: Vec<StoredDump>,
    pub total_bytes: u64,
}

/// Probe for available bytes on the volume holding `path`.
/// Swappable so tests can simulate a full disk.
pub type SpaceProbe = fn(&Path) -> io::Result<u64>;

fn volume_free_space(path: &Path) -> io::Result<u64> {
    fs2::available_space(path)
}

pub struct DumpStore {
    root: PathBuf,
    process_label: String,
    max_file_count: usize,
    min_free_space: u64,
    expired_after: Duration,
    free_space: SpaceProbe,
}

impl DumpStore {
    pub fn new(config: &Config) -> Self {
        Self::with_space_probe(config, volume_free_space)
    }

    /// Same as `new` but with an injected free-space probe. Used by tests to
    /// simulate volume exhaustion without filling a real disk.
    pub fn with_space_probe(config: &Config, probe: SpaceProbe) -> Self {
        DumpStore {
            root: config.storage_root.clone(),
            process_label: config.process_label.clone(),
            max_file_count: config.max_file_count,
            min_free_space: config.min_free_space,
            expired_after: config.expired_after,
            free_space: probe,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reserve a fresh snapshot path.
    ///
    /// Runs the LRU pass unconditionally so the directory self-heals even if
    /// another process dropped files into it, then checks free space and
    /// falls back to a full clear before giving up with `NoSpace`. The
    /// returned path is guaranteed not to exist yet.
    pub fn allocate(&self, prefix: &str) -> Result<SnapshotFile, StoreError> {
        self.ensure_writable_root()?;
        self.evict_lru();
        self.ensure_free_space()?;

        let created_at = Local::now();
        let path = self.fresh_path(prefix, &created_at);

        Ok(SnapshotFile {
            path,
            process_label: self.process_label.clone(),
            process_id: std::process::id(),
            created_at,
        })
    }

    /// Delete every file older than the retention window. Best effort: a
    /// missing directory is a no-op and per-file failures are collected
    /// rather than aborting the sweep.
    pub fn evict_expired(&self) -> SweepSummary {
        let mut summary = SweepSummary::default();
        let now = SystemTime::now();

        for (path, mtime, size) in self.list_files() {
            let age = now.duration_since(mtime).unwrap_or(Duration::ZERO);
            if age <= self.expired_after {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(_) => {
                    log::debug!("swept expired snapshot {}", path.display());
                    summary.deleted_files += 1;
                    summary.deleted_bytes += size;
                }
                Err(e) => {
                    summary
                        .errors
                        .push(format!("failed to delete {}: {e}", path.display()));
                }
            }
        }

        summary
    }

    /// Remove the entire storage directory. Idempotent: a directory that is
    /// already gone counts as success.
    pub fn clear_all(&self) -> io::Result<()> {
        match fs::remove_dir_all(&self.root) {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Enumerate current contents for the maintenance CLI.
    pub fn status(&self) -> StoreStatus {
        let now = SystemTime::now();
        let mut entries = Vec::new();
        let mut total_bytes = 0;

        for (path, mtime, size) in self.list_files() {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let age_secs = now
                .duration_since(mtime)
                .unwrap_or(Duration::ZERO)
                .as_secs();
            total_bytes += size;
            entries.push(StoredDump {
                name,
                size_bytes: size,
                age_secs,
            });
        }

        StoreStatus {
            root: self.root.clone(),
            entries,
            total_bytes,
        }
    }

    fn ensure_writable_root(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root)
            .map_err(|e| StoreError::NotWritable(format!("{}: {e}", self.root.display())))?;

        let meta = fs::metadata(&self.root)
            .map_err(|e| StoreError::NotWritable(format!("{}: {e}", self.root.display())))?;
        if meta.permissions().readonly() {
            return Err(StoreError::NotWritable(format!(
                "{}: read-only",
                self.root.display()
            )));
        }
        Ok(())
    }

    /// Delete the oldest files until at most `max_file_count - 1` remain, so
    /// the allocation about to happen lands exactly at quota. Runs on every
    /// allocation, not only when over budget.
    fn evict_lru(&self) {
        let files = self.list_files();
        if files.len() < self.max_file_count {
            return;
        }

        let excess = files.len() - self.max_file_count + 1;
        for (path, _, _) in files.iter().take(excess) {
            match fs::remove_file(path) {
                Ok(_) => log::debug!("lru-evicted snapshot {}", path.display()),
                Err(e) => log::warn!("failed to lru-evict {}: {e}", path.display()),
            }
        }
    }

    /// Free-space floor check, after LRU eviction. If short, clears every
    /// remaining file as a last resort before reporting `NoSpace`.
    fn ensure_free_space(&self) -> Result<(), StoreError> {
        let free = match (self.free_space)(&self.root) {
            Ok(free) => free,
            Err(e) => {
                // cannot conclude a shortage from a failed probe
                log::warn!("free-space probe failed for {}: {e}", self.root.display());
                return Ok(());
            }
        };
        if free >= self.min_free_space {
            return Ok(());
        }

        log::warn!(
            "free space {free} below floor {}, clearing all snapshots",
            self.min_free_space
        );
        for (path, _, _) in self.list_files() {
            if let Err(e) = fs::remove_file(&path) {
                log::warn!("emergency clear failed for {}: {e}", path.display());
            }
        }

        let free = (self.free_space)(&self.root).unwrap_or(free);
        if free < self.min_free_space {
            return Err(StoreError::NoSpace {
                free,
                required: self.min_free_space,
            });
        }
        Ok(())
    }

    /// Build a path that does not exist yet. The timestamp has second
    /// resolution, so a same-second re-allocation for the same pid and
    /// prefix would collide; a monotonic suffix disambiguates instead of
    /// silently overwriting.
    fn fresh_path(&self, prefix: &str, created_at: &DateTime<Local>) -> PathBuf {
        let stamp = created_at.format("%Y-%m-%d-%H-%M-%S");
        let base = format!(
            "{prefix}-{}-{}-{stamp}",
            self.process_label,
            std::process::id()
        );

        let candidate = self.root.join(format!("{base}.{SNAPSHOT_EXT}"));
        if !candidate.exists() {
            return candidate;
        }
        let mut n = 1;
        loop {
            let candidate = self.root.join(format!("{base}-{n}.{SNAPSHOT_EXT}"));
            if !candidate.exists() {
                return candidate;
            }
            n += 1;
        }
    }

    /// Regular files in the storage directory, oldest first by modification
    /// time. Ties keep enumeration order (stable sort). A missing directory
    /// yields an empty list.
    fn list_files(&self) -> Vec<(PathBuf, SystemTime, u64)> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };

        let mut files: Vec<(PathBuf, SystemTime, u64)> = entries
            .flatten()
            .filter_map(|entry| {
                let meta = entry.metadata().ok()?;
                if !meta.is_file() {
                    return None;
                }
                let mtime = meta.modified().ok()?;
                Some((entry.path(), mtime, meta.len()))
            })
            .collect();

        files.sort_by_key(|(_, mtime, _)| *mtime);
        files
    }
}

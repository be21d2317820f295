//! File-backed voice task store.
//!
//! One JSON document at `<home>/voice_tasks.json`:
//!
//! ```json
//! { "last_updated": "2026-03-02T09:15:00", "tasks": [ ... ] }
//! ```
//!
//! The store is deliberately forgiving: a missing or corrupt file loads as
//! empty, and a failed save is logged and reported, never raised. Writes go
//! through a temp file and rename so a crash mid-write can't leave a torn
//! document, and every read-modify-write (`add_from_recording`, cleanup)
//! holds the same exclusive advisory lock so a background extraction can't
//! race a concurrent cleanup.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::config;
use crate::domain::VoiceTask;

/// Default retention window for `cleanup_old`
pub const DEFAULT_KEEP_DAYS: i64 = 30;

#[derive(Debug, Serialize, Deserialize)]
struct StoredDocument {
    last_updated: String,

    #[serde(default)]
    tasks: Vec<VoiceTask>,
}

/// Store for voice-extracted tasks.
pub struct VoiceTaskStore {
    path: PathBuf,
}

impl VoiceTaskStore {
    /// Store backed by an explicit file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the configured location (`<home>/voice_tasks.json`)
    pub fn open_default() -> anyhow::Result<Self> {
        Ok(Self::new(config::voice_tasks_path()?))
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every stored task.
    ///
    /// A missing or unreadable file loads as an empty list.
    pub fn load_all(&self) -> Vec<VoiceTask> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!("Failed to read task store {}: {}", self.path.display(), e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<StoredDocument>(&content) {
            Ok(doc) => doc.tasks,
            Err(e) => {
                warn!("Task store {} is corrupt, treating as empty: {}", self.path.display(), e);
                Vec::new()
            }
        }
    }

    /// Replace the stored set, stamping `last_updated`.
    ///
    /// Returns `false` on failure (already logged).
    pub fn save_all(&self, tasks: &[VoiceTask]) -> bool {
        match self.write_document(tasks) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to save task store {}: {:#}", self.path.display(), e);
                false
            }
        }
    }

    fn write_document(&self, tasks: &[VoiceTask]) -> anyhow::Result<()> {
        use anyhow::Context;

        let doc = StoredDocument {
            last_updated: Local::now().naive_local().format("%Y-%m-%dT%H:%M:%S").to_string(),
            tasks: tasks.to_vec(),
        };

        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;

        let mut temp = NamedTempFile::new_in(parent).context("Failed to create temp file")?;
        serde_json::to_writer_pretty(&mut temp, &doc).context("Failed to serialize tasks")?;
        temp.write_all(b"\n")?;
        temp.flush()?;
        temp.persist(&self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;

        Ok(())
    }

    /// Merge in tasks extracted from one recording.
    ///
    /// Stored tasks from the same recording are replaced, so reprocessing an
    /// audio file is idempotent. Empty input is a no-op. The read-modify-write
    /// runs under an exclusive file lock.
    pub fn add_from_recording(&self, new_tasks: &[VoiceTask]) -> bool {
        if new_tasks.is_empty() {
            return true;
        }

        let _lock = match self.acquire_lock() {
            Ok(lock) => lock,
            Err(e) => {
                warn!("Failed to lock task store {}: {:#}", self.path.display(), e);
                return false;
            }
        };

        let recording_id = &new_tasks[0].recording_id;

        let mut tasks = self.load_all();
        let before = tasks.len();
        tasks.retain(|t| &t.recording_id != recording_id);
        if tasks.len() != before {
            debug!(
                "Replacing {} stored tasks for recording {}",
                before - tasks.len(),
                recording_id
            );
        }
        tasks.extend_from_slice(new_tasks);

        self.save_all(&tasks)
    }

    fn acquire_lock(&self) -> anyhow::Result<StoreLock> {
        use anyhow::Context;

        let lock_path = self.path.with_extension("lock");
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&lock_path)
            .with_context(|| format!("Failed to open lock file {}", lock_path.display()))?;
        file.lock_exclusive().context("Failed to acquire store lock")?;

        Ok(StoreLock { file })
    }

    /// Tasks for today that have not yet elapsed
    pub fn get_today_tasks(&self) -> Vec<VoiceTask> {
        self.load_all()
            .into_iter()
            .filter(|t| t.is_today() && t.is_not_past_due())
            .collect()
    }

    /// Today's and future tasks that have not yet elapsed
    pub fn get_active_tasks(&self) -> Vec<VoiceTask> {
        self.load_all()
            .into_iter()
            .filter(|t| t.is_not_past_due())
            .collect()
    }

    /// Drop tasks dated more than `days_to_keep` days ago.
    ///
    /// Tasks with absent or unparsable dates are always retained.
    pub fn cleanup_old(&self, days_to_keep: i64) -> bool {
        let cutoff = Local::now().date_naive() - chrono::Duration::days(days_to_keep);
        self.cleanup_before(cutoff)
    }

    fn cleanup_before(&self, cutoff: NaiveDate) -> bool {
        // Same lock as add_from_recording; cleanup is a read-modify-write too
        let _lock = match self.acquire_lock() {
            Ok(lock) => lock,
            Err(e) => {
                warn!("Failed to lock task store {}: {:#}", self.path.display(), e);
                return false;
            }
        };

        let tasks = self.load_all();
        let before = tasks.len();

        let kept: Vec<_> = tasks
            .into_iter()
            .filter(|t| match t.parsed_date() {
                Some(date) => date >= cutoff,
                None => true,
            })
            .collect();

        if kept.len() != before {
            debug!("Cleanup removed {} old tasks", before - kept.len());
        }

        self.save_all(&kept)
    }
}

struct StoreLock {
    file: std::fs::File,
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
    }
}

//! Recordings directory watcher.
//!
//! Watches for new audio files and emits an event only once a file has been
//! stable (unchanged size) for the configured delay, so a recording still
//! being written or synced is never picked up half-finished.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{DateTime, Utc};
use notify::RecursiveMode;
use notify_debouncer_mini::new_debouncer;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config;
use crate::domain::recording::content_hash;

/// Errors from the recordings watcher
#[derive(Debug, Error)]
pub enum WatcherError {
    #[error("Watch directory does not exist: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("Notify error: {0}")]
    Notify(#[from] notify::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Watcher configuration
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Directory to watch
    pub watch_path: PathBuf,

    /// How long a file's size must be unchanged before processing (seconds)
    pub stability_delay_secs: u64,

    /// Audio file extensions to pick up
    pub extensions: Vec<String>,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            watch_path: config::recordings_dir()
                .unwrap_or_else(|_| PathBuf::from("recordings")),
            stability_delay_secs: 3,
            extensions: vec!["m4a".to_string(), "wav".to_string(), "mp3".to_string()],
        }
    }
}

impl WatcherConfig {
    fn validate(&self) -> Result<(), WatcherError> {
        if !self.watch_path.is_dir() {
            return Err(WatcherError::DirectoryNotFound(self.watch_path.clone()));
        }
        Ok(())
    }

    fn is_audio_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }
}

/// Emitted when an audio file is detected and stable
#[derive(Debug, Clone)]
pub struct AudioFileEvent {
    /// Path to the audio file
    pub path: PathBuf,

    /// Content-hash ID of the file
    pub hash: String,

    /// File size in bytes
    pub size: u64,

    /// When the file became stable
    pub detected_at: DateTime<Utc>,
}

/// Watches the recordings directory for stable new audio files
pub struct RecordingWatcher {
    config: WatcherConfig,
}

impl RecordingWatcher {
    pub fn new() -> Self {
        Self { config: WatcherConfig::default() }
    }

    pub fn with_config(config: WatcherConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WatcherConfig {
        &self.config
    }

    /// Start watching; events arrive on the returned receiver until the
    /// handle is stopped.
    pub fn watch(&self) -> Result<(mpsc::Receiver<AudioFileEvent>, WatchHandle)> {
        self.config.validate()?;

        let (event_tx, event_rx) = mpsc::channel::<AudioFileEvent>(100);
        let (stop_tx, stop_rx) = mpsc::channel::<()>(1);

        let config = self.config.clone();
        let task = tokio::task::spawn_blocking(move || {
            if let Err(e) = run_watcher(config, event_tx, stop_rx) {
                tracing::error!("Recordings watcher failed: {:#}", e);
            }
        });

        Ok((event_rx, WatchHandle { stop_tx, task }))
    }
}

impl Default for RecordingWatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to stop the watcher
pub struct WatchHandle {
    stop_tx: mpsc::Sender<()>,
    task: tokio::task::JoinHandle<()>,
}

impl WatchHandle {
    pub async fn stop(self) -> Result<()> {
        let _ = self.stop_tx.send(()).await;
        self.task.await?;
        Ok(())
    }
}

fn run_watcher(
    config: WatcherConfig,
    event_tx: mpsc::Sender<AudioFileEvent>,
    mut stop_rx: mpsc::Receiver<()>,
) -> Result<()> {
    // Files waiting to stabilize: path -> (last size, last change seen)
    let mut pending: HashMap<PathBuf, (u64, Instant)> = HashMap::new();

    let (tx, rx) = std::sync::mpsc::channel();
    let mut debouncer = new_debouncer(Duration::from_secs(1), tx)?;
    debouncer
        .watcher()
        .watch(&config.watch_path, RecursiveMode::NonRecursive)?;

    let stability_delay = Duration::from_secs(config.stability_delay_secs);

    info!("Watching {} for audio files", config.watch_path.display());

    loop {
        if stop_rx.try_recv().is_ok() {
            info!("Recordings watcher stopping");
            break;
        }

        match rx.recv_timeout(Duration::from_millis(500)) {
            Ok(Ok(events)) => {
                for event in events {
                    let path = event.path;
                    if !config.is_audio_file(&path) {
                        continue;
                    }
                    if let Ok(metadata) = std::fs::metadata(&path) {
                        if metadata.is_file() {
                            pending.insert(path, (metadata.len(), Instant::now()));
                        }
                    }
                }
            }
            Ok(Err(e)) => warn!("Watch event error: {:?}", e),
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {}
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                warn!("Watch channel disconnected");
                break;
            }
        }

        let now = Instant::now();
        let mut stable = Vec::new();
        let mut grew = Vec::new();

        for (path, (last_size, last_seen)) in &pending {
            if now.duration_since(*last_seen) < stability_delay {
                continue;
            }
            match std::fs::metadata(path) {
                Ok(metadata) if metadata.len() == *last_size && metadata.len() > 0 => {
                    stable.push((path.clone(), metadata.len()));
                }
                Ok(metadata) => grew.push((path.clone(), metadata.len())),
                Err(_) => {
                    // Gone; forget it
                    stable.push((path.clone(), 0));
                }
            }
        }

        for (path, size) in grew {
            pending.insert(path, (size, Instant::now()));
        }

        for (path, size) in stable {
            pending.remove(&path);
            if size == 0 {
                continue;
            }

            match std::fs::read(&path) {
                Ok(bytes) => {
                    let hash = content_hash(&bytes);
                    debug!("Stable audio file {} ({})", path.display(), hash);
                    let _ = event_tx.blocking_send(AudioFileEvent {
                        path,
                        hash,
                        size,
                        detected_at: Utc::now(),
                    });
                }
                Err(e) => warn!("Failed to read {}: {}", path.display(), e),
            }
        }
    }

    Ok(())
}

//! The refresh engine: one cycle turns calendar events and stored voice
//! tasks into a freshly rendered wallpaper.
//!
//! Ticks are driven by a `tokio::time::interval`. When a cycle is still
//! running at the next tick, the tick is skipped outright rather than
//! queued. A failed cycle flips the engine status to `Error` and the next
//! tick proceeds normally; the engine never dies from a tick failure.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::adapters::{CalendarSource, GoogleCalendar};
use crate::classifier::Classifier;
use crate::combine::combine_tasks;
use crate::config::ResolvedConfig;
use crate::domain::CalendarEvent;
use crate::render::render_wallpaper;
use crate::store::VoiceTaskStore;

use super::retention::{cleanup_wallpapers, generate_wallpaper_filename};

/// Engine health, visible to the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    Idle,
    Ok,
    Error,
}

const STATUS_IDLE: u8 = 0;
const STATUS_OK: u8 = 1;
const STATUS_ERROR: u8 = 2;

/// Periodic wallpaper refresh engine.
pub struct RefreshEngine {
    calendar: Option<Arc<dyn CalendarSource>>,
    classifier: Arc<Classifier>,
    store: Arc<VoiceTaskStore>,

    wallpapers_dir: PathBuf,
    screen: (u32, u32),
    interval: Duration,
    wallpapers_keep: usize,
    voice_task_days: i64,
    wallpaper_command: Option<String>,

    busy: Mutex<()>,
    status: AtomicU8,
}

impl RefreshEngine {
    /// Build an engine from resolved configuration.
    ///
    /// A missing calendar token just means refreshes run with no events.
    pub fn from_config(
        config: &ResolvedConfig,
        classifier: Arc<Classifier>,
        store: Arc<VoiceTaskStore>,
    ) -> Self {
        let calendar = config
            .google_calendar_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(|token| Arc::new(GoogleCalendar::new(token)) as Arc<dyn CalendarSource>);

        if calendar.is_none() {
            warn!("No calendar token configured; refreshes will show voice tasks only");
        }

        Self {
            calendar,
            classifier,
            store,
            wallpapers_dir: config.wallpapers_dir(),
            screen: config.refresh.fallback_screen,
            interval: Duration::from_secs(config.refresh.interval_seconds),
            wallpapers_keep: config.retention.wallpapers_keep,
            voice_task_days: config.retention.voice_task_days,
            wallpaper_command: config.wallpaper_command.clone(),
            busy: Mutex::new(()),
            status: AtomicU8::new(STATUS_IDLE),
        }
    }

    /// Engine for an explicit calendar source (tests use a mock here)
    pub fn with_calendar(
        calendar: Option<Arc<dyn CalendarSource>>,
        classifier: Arc<Classifier>,
        store: Arc<VoiceTaskStore>,
        wallpapers_dir: PathBuf,
        screen: (u32, u32),
    ) -> Self {
        Self {
            calendar,
            classifier,
            store,
            wallpapers_dir,
            screen,
            interval: Duration::from_secs(60),
            wallpapers_keep: 3,
            voice_task_days: 30,
            wallpaper_command: None,
            busy: Mutex::new(()),
            status: AtomicU8::new(STATUS_IDLE),
        }
    }

    /// Current engine status
    pub fn status(&self) -> EngineStatus {
        match self.status.load(Ordering::Relaxed) {
            STATUS_OK => EngineStatus::Ok,
            STATUS_ERROR => EngineStatus::Error,
            _ => EngineStatus::Idle,
        }
    }

    /// Run refresh ticks until the task is cancelled
    pub async fn run(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            self.tick().await;
        }
    }

    /// One tick: skip entirely if the previous cycle still runs
    pub async fn tick(&self) {
        let guard = match self.busy.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                debug!("Previous refresh still running, skipping tick");
                return;
            }
        };

        match self.cycle(None).await {
            Ok(path) => {
                self.status.store(STATUS_OK, Ordering::Relaxed);
                debug!("Refresh complete: {}", path.display());
            }
            Err(e) => {
                self.status.store(STATUS_ERROR, Ordering::Relaxed);
                error!("Refresh failed: {:#}", e);
            }
        }

        drop(guard);
    }

    /// Run one cycle now, waiting for any in-flight cycle to finish first
    pub async fn refresh_now(&self, out: Option<PathBuf>) -> Result<PathBuf> {
        let _guard = self.busy.lock().await;

        let result = self.cycle(out).await;
        self.status.store(
            if result.is_ok() { STATUS_OK } else { STATUS_ERROR },
            Ordering::Relaxed,
        );
        result
    }

    async fn cycle(&self, out: Option<PathBuf>) -> Result<PathBuf> {
        let today = Local::now().date_naive();

        let events: Vec<CalendarEvent> = match &self.calendar {
            Some(calendar) => calendar
                .today_events()
                .await
                .context("Failed to fetch calendar events")?,
            None => Vec::new(),
        };

        let calendar_tasks = self.classifier.triage(today, &events).await;
        let voice_tasks = self.store.get_today_tasks();
        let combined = combine_tasks(calendar_tasks, &voice_tasks);

        info!(
            "Refreshing: {} events, {} combined tasks",
            events.len(),
            combined.len()
        );

        let out_path = out.unwrap_or_else(|| generate_wallpaper_filename(&self.wallpapers_dir));

        let screen = self.screen;
        let render_path = out_path.clone();
        let render_events = events;
        tokio::task::spawn_blocking(move || {
            render_wallpaper(&combined, &render_events, screen, &render_path)
        })
        .await
        .context("Render task panicked")??;

        self.run_wallpaper_hook(&out_path).await;

        self.store.cleanup_old(self.voice_task_days);
        if let Err(e) =
            cleanup_wallpapers(&self.wallpapers_dir, self.wallpapers_keep, Some(&out_path))
        {
            warn!("Wallpaper cleanup failed: {:#}", e);
        }

        Ok(out_path)
    }

    /// Best-effort post-render hook; a failing command never fails the cycle
    async fn run_wallpaper_hook(&self, path: &std::path::Path) {
        let Some(command) = &self.wallpaper_command else {
            return;
        };

        let command = command.replace("{path}", &path.to_string_lossy());
        debug!("Running wallpaper hook: {}", command);

        match tokio::process::Command::new("sh")
            .arg("-c")
            .arg(&command)
            .status()
            .await
        {
            Ok(status) if status.success() => {}
            Ok(status) => warn!("Wallpaper hook exited with {}", status),
            Err(e) => warn!("Wallpaper hook failed to start: {}", e),
        }
    }
}

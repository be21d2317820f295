//! Voice recording CLI commands.
//!
//! - `taskwall voice process <FILE>` - process one recording now
//! - `taskwall voice watch` - watch the recordings directory
//! - `taskwall voice list` - show extracted tasks
//! - `taskwall voice cleanup` - drop old tasks and recordings

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Subcommand;

use crate::adapters::OpenAiClient;
use crate::classifier::Classifier;
use crate::config;
use crate::core::cleanup_recordings;
use crate::domain::VoiceTask;
use crate::ingest::{ProcessOutcome, RecordingProcessor, RecordingWatcher, WatcherConfig};
use crate::store::VoiceTaskStore;

/// Voice recording subcommands
#[derive(Subcommand, Debug)]
pub enum VoiceCommands {
    /// Process one audio file into tasks
    Process {
        /// Path to the audio file
        file: PathBuf,
    },

    /// Watch the recordings directory and process new files
    Watch {
        /// Directory to watch (defaults to the configured recordings dir)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// List extracted voice tasks
    List {
        /// Show today's and future tasks, not just today's
        #[arg(long)]
        active: bool,

        /// Show every stored task
        #[arg(long)]
        all: bool,
    },

    /// Drop old tasks and recordings
    Cleanup {
        /// Keep tasks dated within this many days
        #[arg(long, default_value = "30")]
        days: i64,
    },
}

pub async fn execute(command: VoiceCommands) -> Result<()> {
    match command {
        VoiceCommands::Process { file } => execute_process(file).await,
        VoiceCommands::Watch { path } => execute_watch(path).await,
        VoiceCommands::List { active, all } => execute_list(active, all),
        VoiceCommands::Cleanup { days } => execute_cleanup(days),
    }
}

fn build_processor() -> Result<RecordingProcessor> {
    let cfg = config::config()?;
    let api_key = cfg
        .openai_api_key
        .as_deref()
        .filter(|k| !k.is_empty())
        .context("No API key configured. Set one with: taskwall key set <KEY>")?;

    Ok(RecordingProcessor::new(
        Arc::new(OpenAiClient::new(api_key)),
        Arc::new(Classifier::new(Some(api_key))),
        Arc::new(VoiceTaskStore::open_default()?),
    ))
}

async fn execute_process(file: PathBuf) -> Result<()> {
    anyhow::ensure!(file.is_file(), "No such file: {}", file.display());

    let processor = build_processor()?;

    println!("🎤 Processing {}", file.display());
    match processor.process(&file).await? {
        ProcessOutcome::Extracted { recording_id, task_count, .. } => {
            println!("✅ {} task(s) extracted (recording {})", task_count, recording_id);
        }
        ProcessOutcome::NotTaskRelated { recording_id, .. } => {
            println!("ℹ️  Not task-related, nothing stored (recording {})", recording_id);
        }
    }

    Ok(())
}

async fn execute_watch(path: Option<PathBuf>) -> Result<()> {
    let mut watcher_config = WatcherConfig::default();
    if let Some(p) = path {
        watcher_config.watch_path = p;
    }
    std::fs::create_dir_all(&watcher_config.watch_path)
        .with_context(|| format!("Failed to create {}", watcher_config.watch_path.display()))?;

    let processor = Arc::new(build_processor()?);

    println!("👂 Watching {} (Ctrl-C to stop)", watcher_config.watch_path.display());

    let watcher = RecordingWatcher::with_config(watcher_config);
    let (events, handle) = watcher.watch()?;

    let (notify_tx, mut notify_rx) = tokio::sync::mpsc::channel(16);
    tokio::spawn(processor.run(events, notify_tx));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            outcome = notify_rx.recv() => {
                match outcome {
                    Some(ProcessOutcome::Extracted { filename, task_count, .. }) => {
                        println!("✅ {} task(s) extracted from {}", task_count, filename);
                    }
                    Some(ProcessOutcome::NotTaskRelated { filename, .. }) => {
                        println!("ℹ️  {} was not task-related", filename);
                    }
                    None => break,
                }
            }
        }
    }

    handle.stop().await?;
    Ok(())
}

fn execute_list(active: bool, all: bool) -> Result<()> {
    let store = VoiceTaskStore::open_default()?;

    let (tasks, scope) = if all {
        (store.load_all(), "all")
    } else if active {
        (store.get_active_tasks(), "active")
    } else {
        (store.get_today_tasks(), "today")
    };

    println!();
    println!("Voice tasks ({})", scope);
    println!("══════════════════════════════════════════════════════════════");

    if tasks.is_empty() {
        println!("  (none)");
        println!();
        return Ok(());
    }

    for task in &tasks {
        println!("  {}", format_task_line(task));
    }
    println!();
    println!("  {} task(s)", tasks.len());
    println!();

    Ok(())
}

fn format_task_line(task: &VoiceTask) -> String {
    let mut line = format!("[P{}]", task.priority);

    if let Some(date) = &task.date {
        line.push_str(&format!(" {}", date));
    }
    if let Some(range) = task.time_range() {
        line.push_str(&format!(" {}", range));
    }
    if let Some(emoji) = &task.emoji {
        line.push_str(&format!(" {}", emoji));
    }

    line.push_str(&format!(" {} (rec {})", task.title, task.recording_id));
    line
}

fn execute_cleanup(days: i64) -> Result<()> {
    let cfg = config::config()?;
    let store = VoiceTaskStore::open_default()?;

    let before = store.load_all().len();
    anyhow::ensure!(store.cleanup_old(days), "Task cleanup failed");
    let removed_tasks = before - store.load_all().len();

    let removed_recordings = cleanup_recordings(
        &cfg.recordings_dir(),
        cfg.retention.recordings_keep,
        None,
    )?;

    println!("🧹 Removed {} task(s) older than {} days", removed_tasks, days);
    println!("🧹 Removed {} old recording(s)", removed_recordings);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use serde_json::json;

    #[test]
    fn test_format_task_line() {
        let today = chrono::NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let task = VoiceTask::from_value(
            &json!({
                "title": "Call dentist",
                "priority": 2,
                "start_time": "14:30",
                "emoji": "🦷",
            }),
            today,
            "1a2b3c",
        )
        .unwrap();

        assert_eq!(
            format_task_line(&task),
            "[P2] 2026-03-02 14:30 🦷 Call dentist (rec 1a2b3c)"
        );
    }

    #[test]
    fn test_format_task_line_minimal() {
        let task = VoiceTask::from_value(
            &json!({"title": "Buy milk"}),
            Local::now().date_naive(),
            "r",
        )
        .unwrap();

        let line = format_task_line(&task);
        assert!(line.starts_with("[P3]"));
        assert!(line.contains("Buy milk"));
    }
}

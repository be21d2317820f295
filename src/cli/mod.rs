//! Command-line interface for taskwall.
//!
//! Provides commands for running the refresh daemon, forcing a single
//! refresh, managing voice recordings, and inspecting configuration.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use crate::classifier::Classifier;
use crate::config;
use crate::core::RefreshEngine;
use crate::ingest::{ProcessOutcome, RecordingProcessor, RecordingWatcher, WatcherConfig};
use crate::store::VoiceTaskStore;

pub mod voice;

/// taskwall - calendar and voice tasks on your wallpaper
#[derive(Parser, Debug)]
#[command(name = "taskwall")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the refresh daemon and recording watcher
    Run,

    /// Run one refresh cycle now
    Refresh {
        /// Write the wallpaper to this path instead of the wallpapers
        /// directory
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Manage voice recordings and extracted tasks
    Voice {
        #[command(subcommand)]
        command: voice::VoiceCommands,
    },

    /// Show resolved configuration
    Config,

    /// Manage the classifier API key
    Key {
        #[command(subcommand)]
        command: KeyCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum KeyCommands {
    /// Store the API key in the config file
    Set {
        /// The API key
        api_key: String,
    },

    /// Show whether an API key is configured
    Status,
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Run => execute_run().await,
            Commands::Refresh { out } => execute_refresh(out).await,
            Commands::Voice { command } => voice::execute(command).await,
            Commands::Config => execute_config(),
            Commands::Key { command } => execute_key(command),
        }
    }
}

/// Build the shared services from resolved config
fn build_services() -> Result<(Arc<Classifier>, Arc<VoiceTaskStore>)> {
    let cfg = config::config()?;
    let classifier = Arc::new(Classifier::new(cfg.openai_api_key.as_deref()));
    let store = Arc::new(VoiceTaskStore::open_default()?);
    Ok((classifier, store))
}

/// Daemon: refresh loop plus recording watcher
async fn execute_run() -> Result<()> {
    let cfg = config::config()?;

    std::fs::create_dir_all(cfg.wallpapers_dir())
        .with_context(|| format!("Failed to create {}", cfg.wallpapers_dir().display()))?;
    std::fs::create_dir_all(cfg.recordings_dir())
        .with_context(|| format!("Failed to create {}", cfg.recordings_dir().display()))?;

    let (classifier, store) = build_services()?;
    let engine = Arc::new(RefreshEngine::from_config(
        cfg,
        Arc::clone(&classifier),
        Arc::clone(&store),
    ));

    println!("🖼  taskwall running (refresh every {}s)", cfg.refresh.interval_seconds);
    println!("    Home:       {}", cfg.home.display());
    println!("    Recordings: {}", cfg.recordings_dir().display());
    println!();

    let refresh_task = tokio::spawn(Arc::clone(&engine).run());

    // Recording pipeline needs the transcription credential
    let mut watch_handle = None;
    let mut notify_rx = None;

    if let Some(api_key) = cfg.openai_api_key.as_deref().filter(|k| !k.is_empty()) {
        let watcher = RecordingWatcher::with_config(WatcherConfig {
            watch_path: cfg.recordings_dir(),
            ..WatcherConfig::default()
        });
        let (events, handle) = watcher.watch()?;

        let processor = Arc::new(RecordingProcessor::new(
            Arc::new(crate::adapters::OpenAiClient::new(api_key)),
            classifier,
            store,
        ));

        let (notify_tx, rx) = tokio::sync::mpsc::channel(16);
        tokio::spawn(processor.run(events, notify_tx));

        watch_handle = Some(handle);
        notify_rx = Some(rx);
    } else {
        println!("⚠️  No API key configured; voice recordings will not be processed");
        println!("    Set one with: taskwall key set <KEY>");
        println!();
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            outcome = recv_outcome(&mut notify_rx) => {
                match outcome {
                    Some(outcome) => print_outcome(&outcome),
                    // Channel closed; stop polling it
                    None => notify_rx = None,
                }
            }
        }
    }

    info!("Shutting down");
    refresh_task.abort();
    if let Some(handle) = watch_handle {
        handle.stop().await?;
    }

    Ok(())
}

async fn recv_outcome(
    rx: &mut Option<tokio::sync::mpsc::Receiver<ProcessOutcome>>,
) -> Option<ProcessOutcome> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

fn print_outcome(outcome: &ProcessOutcome) {
    match outcome {
        ProcessOutcome::Extracted { filename, task_count, .. } => {
            println!("🎤 {} task(s) extracted from {}", task_count, filename);
        }
        ProcessOutcome::NotTaskRelated { filename, .. } => {
            println!("🎤 {} was not task-related", filename);
        }
    }
}

/// One refresh cycle now
async fn execute_refresh(out: Option<PathBuf>) -> Result<()> {
    let cfg = config::config()?;
    std::fs::create_dir_all(cfg.wallpapers_dir())
        .with_context(|| format!("Failed to create {}", cfg.wallpapers_dir().display()))?;

    let (classifier, store) = build_services()?;
    let engine = RefreshEngine::from_config(cfg, classifier, store);

    let path = engine.refresh_now(out).await?;
    println!("✅ Wallpaper written to {}", path.display());

    Ok(())
}

fn execute_config() -> Result<()> {
    let cfg = config::config()?;

    println!();
    println!("taskwall configuration");
    println!("══════════════════════════════════════════════════════════════");
    println!();
    match &cfg.config_file {
        Some(path) => println!("Config file:     {}", path.display()),
        None => println!("Config file:     (none, using defaults)"),
    }
    println!("Home:            {}", cfg.home.display());
    println!("Wallpapers:      {}", cfg.wallpapers_dir().display());
    println!("Recordings:      {}", cfg.recordings_dir().display());
    println!("Voice tasks:     {}", cfg.voice_tasks_path().display());
    println!();
    println!("Refresh:         every {}s", cfg.refresh.interval_seconds);
    println!(
        "Fallback screen: {}x{}",
        cfg.refresh.fallback_screen.0, cfg.refresh.fallback_screen.1
    );
    println!(
        "Retention:       {} wallpapers, {} recordings, {} task days",
        cfg.retention.wallpapers_keep, cfg.retention.recordings_keep, cfg.retention.voice_task_days
    );
    match &cfg.wallpaper_command {
        Some(command) => println!("Wallpaper hook:  {}", command),
        None => println!("Wallpaper hook:  (none)"),
    }
    println!();
    println!("OpenAI key:      {}", mask_presence(cfg.openai_api_key.as_deref()));
    println!("Calendar token:  {}", mask_presence(cfg.google_calendar_token.as_deref()));
    println!();

    Ok(())
}

fn execute_key(command: KeyCommands) -> Result<()> {
    match command {
        KeyCommands::Set { api_key } => {
            let path = config::save_api_key(&api_key)?;
            println!("🔑 API key saved to {}", path.display());
            println!("    Restart `taskwall run` to pick it up.");
            Ok(())
        }
        KeyCommands::Status => {
            let cfg = config::config()?;
            println!("OpenAI key: {}", mask_presence(cfg.openai_api_key.as_deref()));
            Ok(())
        }
    }
}

fn mask_presence(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => {
            let prefix: String = v.chars().take(7).collect();
            format!("{}… (set)", prefix)
        }
        _ => "(not set)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_refresh_with_out() {
        let cli = Cli::parse_from(["taskwall", "refresh", "--out", "/tmp/wall.png"]);
        match cli.command {
            Commands::Refresh { out } => {
                assert_eq!(out, Some(PathBuf::from("/tmp/wall.png")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_parses_voice_cleanup_days() {
        let cli = Cli::parse_from(["taskwall", "voice", "cleanup", "--days", "7"]);
        match cli.command {
            Commands::Voice { command: voice::VoiceCommands::Cleanup { days } } => {
                assert_eq!(days, 7);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_mask_presence() {
        assert_eq!(mask_presence(None), "(not set)");
        assert_eq!(mask_presence(Some("")), "(not set)");
        assert_eq!(mask_presence(Some("sk-abcdef123")), "sk-abcd… (set)");
    }
}

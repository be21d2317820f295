//! taskwall - calendar and voice tasks on your wallpaper
//!
//! A desktop utility that periodically triages today's calendar events and
//! voice-extracted tasks into a small prioritized list and renders it onto a
//! wallpaper-sized PNG.
//!
//! # Pipeline
//!
//! Each refresh cycle:
//! - fetch today's calendar events
//! - triage them into urgent tasks (chat service, heuristic fallback)
//! - merge in today's stored voice tasks
//! - rank, cap at six, and render the card onto a fresh wallpaper
//!
//! Voice recordings are picked up from a watched directory, transcribed,
//! and turned into persisted tasks in the background.
//!
//! # Modules
//!
//! - `adapters`: external services (calendar, chat, transcription)
//! - `classifier`: triage and voice task extraction
//! - `store`: file-backed voice task store
//! - `combine`: merge and rank calendar and voice tasks
//! - `render`: layout and PNG rasterization
//! - `ingest`: recordings watcher and processor
//! - `core`: refresh engine and artifact retention
//! - `cli`: command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Run the daemon
//! taskwall run
//!
//! # Force one refresh
//! taskwall refresh --out /tmp/wall.png
//!
//! # Process a voice memo by hand
//! taskwall voice process ~/memo.m4a
//! ```

pub mod adapters;
pub mod classifier;
pub mod cli;
pub mod combine;
pub mod config;
pub mod core;
pub mod domain;
pub mod ingest;
pub mod render;
pub mod store;

// Re-export main types at crate root for convenience
pub use classifier::Classifier;
pub use combine::combine_tasks;
pub use core::{EngineStatus, RefreshEngine};
pub use domain::{CalendarEvent, DisplayItem, Recording, UrgentTask, VoiceTask};
pub use ingest::{AudioFileEvent, RecordingProcessor, RecordingWatcher, WatcherConfig};
pub use render::render_wallpaper;
pub use store::VoiceTaskStore;

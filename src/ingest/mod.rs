//! Recording ingest: directory watching and background processing.
//!
//! New audio files land in the recordings directory, the watcher waits for
//! them to stabilize, and the processor turns each one into stored voice
//! tasks (transcribe, extract, persist).

pub mod processor;
pub mod watcher;

pub use processor::{ProcessOutcome, RecordingProcessor};
pub use watcher::{AudioFileEvent, RecordingWatcher, WatchHandle, WatcherConfig};

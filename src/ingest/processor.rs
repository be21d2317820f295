//! Recording processing: transcribe, extract, persist.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::adapters::Transcriber;
use crate::classifier::Classifier;
use crate::domain::Recording;
use crate::store::VoiceTaskStore;

use super::AudioFileEvent;

/// What became of one recording
#[derive(Debug, Clone)]
pub enum ProcessOutcome {
    /// Tasks were extracted and stored
    Extracted {
        recording_id: String,
        filename: String,
        task_count: usize,
    },

    /// Transcript was empty or not task-related; nothing stored
    NotTaskRelated {
        recording_id: String,
        filename: String,
    },
}

/// Turns one audio file into stored voice tasks.
pub struct RecordingProcessor {
    transcriber: Arc<dyn Transcriber>,
    classifier: Arc<Classifier>,
    store: Arc<VoiceTaskStore>,
}

impl RecordingProcessor {
    pub fn new(
        transcriber: Arc<dyn Transcriber>,
        classifier: Arc<Classifier>,
        store: Arc<VoiceTaskStore>,
    ) -> Self {
        Self { transcriber, classifier, store }
    }

    /// Process one audio file end to end.
    ///
    /// The recording ID is the file's content hash, and the store replaces
    /// tasks by recording, so processing the same file twice converges on
    /// one set of tasks.
    pub async fn process(&self, path: &Path) -> Result<ProcessOutcome> {
        let recording = Recording::from_file(path)
            .await
            .with_context(|| format!("Failed to read recording {}", path.display()))?;

        info!("Processing recording {} ({})", recording.filename, recording.id);

        let transcript = self
            .transcriber
            .transcribe(path)
            .await
            .with_context(|| format!("Transcription failed for {}", path.display()))?;

        if transcript.is_empty() {
            return Ok(ProcessOutcome::NotTaskRelated {
                recording_id: recording.id,
                filename: recording.filename,
            });
        }

        let tasks = match self.classifier.extract(&transcript, &recording.id).await {
            Some(tasks) => tasks,
            None => {
                info!("Recording {} was not task-related", recording.id);
                return Ok(ProcessOutcome::NotTaskRelated {
                    recording_id: recording.id,
                    filename: recording.filename,
                });
            }
        };

        let task_count = tasks.len();
        if !self.store.add_from_recording(&tasks) {
            anyhow::bail!("Failed to store tasks for recording {}", recording.id);
        }

        info!("Stored {} tasks from recording {}", task_count, recording.id);

        Ok(ProcessOutcome::Extracted {
            recording_id: recording.id,
            filename: recording.filename,
            task_count,
        })
    }

    /// Drain watcher events until the channel closes, reporting each outcome
    /// on `notify`. A failed recording is logged and skipped.
    pub async fn run(
        self: Arc<Self>,
        mut events: mpsc::Receiver<AudioFileEvent>,
        notify: mpsc::Sender<ProcessOutcome>,
    ) {
        while let Some(event) = events.recv().await {
            match self.process(&event.path).await {
                Ok(outcome) => {
                    let _ = notify.send(outcome).await;
                }
                Err(e) => warn!("Failed to process {}: {:#}", event.path.display(), e),
            }
        }
    }
}

//! Voice recording metadata.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Metadata for one captured audio file.
///
/// The recording subsystem owns these; the pipeline only consumes `id` and
/// `path`. The ID is a content hash, so reprocessing the same audio resolves
/// to the same recording and the task store's replace-by-recording semantics
/// make it idempotent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recording {
    /// Content-hash ID (first 12 hex chars of SHA-256)
    pub id: String,

    /// File name only
    pub filename: String,

    /// Full path to the audio file
    pub path: PathBuf,

    /// When the recording was captured (file mtime at detection)
    pub created_at: DateTime<Utc>,

    /// Duration in seconds, if known
    pub duration: Option<f64>,

    /// Transcript, once transcription has run
    pub transcription: Option<String>,

    /// Whether task extraction has completed for this recording
    pub processed: bool,
}

impl Recording {
    /// Build a `Recording` for an audio file on disk, hashing its content
    pub async fn from_file(path: &Path) -> std::io::Result<Self> {
        let content = tokio::fs::read(path).await?;
        let metadata = tokio::fs::metadata(path).await?;

        let created_at = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        Ok(Self {
            id: content_hash(&content),
            filename: path
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string(),
            path: path.to_path_buf(),
            created_at,
            duration: None,
            transcription: None,
            processed: false,
        })
    }
}

/// First 12 hex chars of the SHA-256 of `bytes`
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    hex::encode(&digest[..6])
}

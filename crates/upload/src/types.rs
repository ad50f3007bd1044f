//! Data types for the upload flow.

use std::time::Duration;

use chunkup_protocol::ProgressEvent;
use chunkup_protocol::constants::{DEFAULT_CHUNK_SIZE, DEFAULT_CONCURRENCY};

use crate::error::ErrorKind;

/// Tuning for a single upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadOptions {
    /// Bytes per chunk.
    pub chunk_size: u64,
    /// Maximum chunk uploads in flight; `0` means no limit.
    pub concurrency: usize,
    /// Extra attempts per chunk after a network failure; `0` disables retry.
    pub chunk_retries: u32,
    /// Pause before each retry.
    pub retry_backoff: Duration,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
            chunk_retries: 0,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

/// How a successful upload ended.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    /// The server already had the content; no bytes were sent.
    AlreadyStored {
        file_hash: String,
        message: Option<String>,
    },
    /// Every chunk was uploaded and merged.
    Uploaded { file_hash: String, chunks: u32 },
}

impl UploadOutcome {
    pub fn file_hash(&self) -> &str {
        match self {
            Self::AlreadyStored { file_hash, .. } | Self::Uploaded { file_hash, .. } => file_hash,
        }
    }

    /// Returns `true` for the instant-upload short-circuit.
    pub fn is_instant(&self) -> bool {
        matches!(self, Self::AlreadyStored { .. })
    }
}

/// Event emitted while an upload runs.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    /// Chunking/hashing progress.
    Hashing(ProgressEvent),
    /// Hashing finished.
    Hashed {
        file_hash: String,
        total_size: u64,
        total_chunks: u32,
    },
    /// The existence check was sent.
    Checking,
    /// The server already has the content.
    InstantUpload { message: Option<String> },
    /// A chunk was acknowledged. `uploaded` never decreases.
    ChunkUploaded {
        index: u32,
        uploaded: u32,
        total: u32,
        percent: u8,
        bytes_per_second: f64,
    },
    /// A chunk failed and will be sent again.
    ChunkRetry {
        index: u32,
        attempt: u32,
        error: String,
    },
    /// All chunks are acknowledged; the merge request was sent.
    Merging,
    /// Terminal: the upload succeeded.
    Completed(UploadOutcome),
    /// Terminal: the upload failed or was cancelled.
    Failed { kind: ErrorKind, error: String },
}

impl UploadEvent {
    /// Returns `true` for `Completed` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Failed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options() {
        let opts = UploadOptions::default();
        assert_eq!(opts.chunk_size, 2 * 1024 * 1024);
        assert_eq!(opts.concurrency, 4);
        assert_eq!(opts.chunk_retries, 0);
    }

    #[test]
    fn outcome_accessors() {
        let instant = UploadOutcome::AlreadyStored {
            file_hash: "aa".into(),
            message: None,
        };
        let full = UploadOutcome::Uploaded {
            file_hash: "bb".into(),
            chunks: 3,
        };
        assert!(instant.is_instant());
        assert!(!full.is_instant());
        assert_eq!(instant.file_hash(), "aa");
        assert_eq!(full.file_hash(), "bb");
    }

    #[test]
    fn terminal_events() {
        assert!(UploadEvent::Completed(UploadOutcome::Uploaded {
            file_hash: "x".into(),
            chunks: 1
        })
        .is_terminal());
        assert!(UploadEvent::Failed {
            kind: ErrorKind::Network,
            error: "boom".into()
        }
        .is_terminal());
        assert!(!UploadEvent::Merging.is_terminal());
    }
}

//! Upload error types.

use chunkup_transfer::TransferError;

/// Errors produced during an upload.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("processing failed: {0}")]
    Processing(TransferError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid backend config: {0}")]
    Config(String),

    #[error("background task failed: {0}")]
    Worker(String),

    #[error("cancelled")]
    Cancelled,
}

/// Coarse failure classes reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Reading or hashing the file failed.
    Processing,
    /// The existence check, a chunk upload or the merge failed.
    Network,
    /// The background task died outside the normal result path.
    Worker,
    /// The backend was misconfigured; no request was sent.
    Config,
    Cancelled,
}

impl UploadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Processing(_) => ErrorKind::Processing,
            Self::Http(_) | Self::Api { .. } | Self::Json(_) => ErrorKind::Network,
            Self::Worker(_) => ErrorKind::Worker,
            Self::Config(_) => ErrorKind::Config,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Returns `true` for failures of an HTTP exchange.
    pub fn is_network(&self) -> bool {
        self.kind() == ErrorKind::Network
    }
}

impl From<TransferError> for UploadError {
    fn from(err: TransferError) -> Self {
        match err {
            TransferError::Cancelled => Self::Cancelled,
            TransferError::Worker(msg) => Self::Worker(msg),
            other => Self::Processing(other),
        }
    }
}

//! The chunking/hashing job and its background task handle.

use std::path::{Path, PathBuf};

use chunkup_protocol::ProgressEvent;
use sha2::{Digest, Sha256};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::debug;

use crate::chunked::ChunkReader;
use crate::types::ProcessedFile;
use crate::validation::upload_file_name;
use crate::{DEFAULT_CHUNK_SIZE, TransferError};

/// Capacity of the progress channel between the job and its consumer.
const PROGRESS_CHANNEL_CAPACITY: usize = 256;

/// Parameters of a chunking/hashing job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessOptions {
    /// Bytes per chunk; the last chunk holds the remainder.
    pub chunk_size: u64,
    /// Whether to emit a [`ProgressEvent`] after each chunk.
    pub emit_progress: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            emit_progress: true,
        }
    }
}

impl ProcessOptions {
    /// Options with the given chunk size and progress enabled.
    pub fn with_chunk_size(chunk_size: u64) -> Self {
        Self {
            chunk_size,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), TransferError> {
        if self.chunk_size == 0 {
            return Err(TransferError::InvalidChunkSize(self.chunk_size));
        }
        Ok(())
    }
}

/// Splits `path` into chunks and hashes the whole content in one pass.
///
/// Blocking; run it on a blocking thread (see [`spawn_processing`]).
/// After each chunk a [`ProgressEvent`] with `current = index + 1` is sent on
/// `progress`, waiting for channel capacity. A closed channel does not stop
/// the job. Cancellation is checked before every chunk read.
///
/// Chunk data is dropped once hashed; the result keeps only the spans.
pub fn process_file(
    path: &Path,
    options: &ProcessOptions,
    progress: Option<&mpsc::Sender<ProgressEvent>>,
    cancel: &CancellationToken,
) -> Result<ProcessedFile, TransferError> {
    options.validate()?;
    let file_name = upload_file_name(path)?;
    let mut reader = ChunkReader::new(path, options.chunk_size)?;
    let total_chunks = reader.total_chunks();
    let total_size = reader.file_size();

    let mut hasher = Sha256::new();
    let mut chunks = Vec::with_capacity(total_chunks as usize);

    loop {
        if cancel.is_cancelled() {
            return Err(TransferError::Cancelled);
        }
        let Some(chunk) = reader.next_chunk()? else {
            break;
        };

        hasher.update(&chunk.data);
        let current = chunk.index + 1;
        chunks.push(chunk.span());

        if options.emit_progress
            && let Some(tx) = progress
        {
            let _ = tx.blocking_send(ProgressEvent::new(current, total_chunks));
        }
    }

    let file_hash = hex::encode(hasher.finalize());
    debug!(
        file = %file_name,
        hash = %file_hash,
        total_bytes = total_size,
        chunks = total_chunks,
        "file processed"
    );

    Ok(ProcessedFile {
        path: path.to_path_buf(),
        file_hash,
        file_name,
        total_size,
        total_chunks,
        chunks,
    })
}

/// Runs [`process_file`] on tokio's blocking pool.
///
/// Must be called from within a tokio runtime. Each call starts an
/// independent job; the returned handle is the only way to observe or stop it.
pub fn spawn_processing(path: impl Into<PathBuf>, options: ProcessOptions) -> ProcessingHandle {
    let path = path.into();
    spawn_job(move |tx, cancel| process_file(&path, &options, Some(tx), cancel))
}

/// Runs an arbitrary blocking job behind a [`ProcessingHandle`].
///
/// The job gets the progress sender and the handle's cancellation token.
/// A job that panics surfaces as [`TransferError::Worker`] from `join`.
pub fn spawn_job<F>(job: F) -> ProcessingHandle
where
    F: FnOnce(&mpsc::Sender<ProgressEvent>, &CancellationToken) -> Result<ProcessedFile, TransferError>
        + Send
        + 'static,
{
    let (tx, rx) = mpsc::channel(PROGRESS_CHANNEL_CAPACITY);
    let cancel = CancellationToken::new();

    let task = tokio::task::spawn_blocking({
        let cancel = cancel.clone();
        move || job(&tx, &cancel)
    });

    ProcessingHandle {
        progress: Some(rx),
        guard: cancel.clone().drop_guard(),
        cancel,
        task,
    }
}

/// Caller-owned handle to a background chunking/hashing job.
///
/// Dropping the handle cancels the job.
pub struct ProcessingHandle {
    progress: Option<mpsc::Receiver<ProgressEvent>>,
    cancel: CancellationToken,
    guard: DropGuard,
    task: JoinHandle<Result<ProcessedFile, TransferError>>,
}

impl ProcessingHandle {
    /// Takes the progress receiver. Can only be called once.
    ///
    /// The job waits for channel capacity, so a taken receiver must be
    /// drained (or dropped) for the job to finish.
    pub fn take_progress(&mut self) -> Option<mpsc::Receiver<ProgressEvent>> {
        self.progress.take()
    }

    /// Returns the job's cancellation token.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Requests cooperative cancellation; the job stops before its next chunk.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Waits for the job to finish.
    pub async fn join(mut self) -> Result<ProcessedFile, TransferError> {
        // Nobody will read progress that was never taken.
        drop(self.progress.take());
        let result = match self.task.await {
            Ok(result) => result,
            Err(e) => Err(TransferError::Worker(e.to_string())),
        };
        // The job is over; nothing left to cancel.
        let _ = self.guard.disarm();
        result
    }
}

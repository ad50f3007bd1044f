use std::path::PathBuf;
use std::sync::RwLock;
use std::time::Instant;

use bytes::Bytes;
use chunkup_protocol::WorkerMessage;
use chunkup_protocol::constants::chunk_id;
use chunkup_protocol::types::{TaskProgress, TaskStatus};

/// Byte range `[start, end)` of a planned chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSpan {
    pub index: u32,
    pub start: u64,
    pub end: u64,
}

impl ChunkSpan {
    /// Size of the span in bytes.
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A chunk of file data for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// 0-based position in the file.
    pub index: u32,
    /// First byte offset (inclusive).
    pub start: u64,
    /// Last byte offset (exclusive).
    pub end: u64,
    /// Raw chunk data, `end - start` bytes. Cheap to clone.
    pub data: Bytes,
}

impl Chunk {
    /// Server-side identifier: `{file_hash}-{index}`.
    pub fn id(&self, file_hash: &str) -> String {
        chunk_id(file_hash, self.index)
    }

    /// Size of this chunk in bytes.
    pub fn size(&self) -> u64 {
        self.end - self.start
    }

    pub fn span(&self) -> ChunkSpan {
        ChunkSpan {
            index: self.index,
            start: self.start,
            end: self.end,
        }
    }
}

/// Output of a finished chunking/hashing job.
///
/// Holds the chunk plan, not the data: chunk bytes are read back from `path`
/// when each chunk is uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedFile {
    /// File the chunks are read from.
    pub path: PathBuf,
    /// Hex SHA-256 of the whole file.
    pub file_hash: String,
    pub file_name: String,
    pub total_size: u64,
    pub total_chunks: u32,
    /// Ordered by index; covers `[0, total_size)` exactly once.
    pub chunks: Vec<ChunkSpan>,
}

impl ProcessedFile {
    /// Reads the bytes of `span` from disk.
    pub async fn read_chunk(&self, span: &ChunkSpan) -> Result<Chunk, crate::TransferError> {
        crate::chunked::read_chunk(&self.path, span).await
    }
}

impl From<&ProcessedFile> for WorkerMessage {
    fn from(file: &ProcessedFile) -> Self {
        WorkerMessage::Complete {
            file_hash: file.file_hash.clone(),
            file_name: file.file_name.clone(),
            total_size: file.total_size,
            total_chunks: file.total_chunks,
            chunk_sizes: file.chunks.iter().map(ChunkSpan::len).collect(),
        }
    }
}

impl From<&crate::TransferError> for WorkerMessage {
    fn from(err: &crate::TransferError) -> Self {
        WorkerMessage::Error {
            error: err.to_string(),
        }
    }
}

/// Tracks one upload task from hashing to merge (thread-safe).
///
/// Concurrent chunk uploads share the task only through
/// [`record_chunk`](Self::record_chunk).
pub struct UploadTask {
    inner: RwLock<TaskInner>,
}

struct TaskInner {
    id: String,
    status: TaskStatus,
    file_name: String,
    file_hash: String,
    total_bytes: u64,
    uploaded_bytes: u64,
    total_chunks: u32,
    uploaded_chunks: u32,
    started_at: Instant,
    completed_at: Option<Instant>,
    error: String,
}

impl UploadTask {
    /// Creates a pending task with a fresh random id.
    pub fn new(file_name: impl Into<String>) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), file_name)
    }

    /// Creates a pending task with the given id.
    pub fn with_id(id: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            inner: RwLock::new(TaskInner {
                id: id.into(),
                status: TaskStatus::Pending,
                file_name: file_name.into(),
                file_hash: String::new(),
                total_bytes: 0,
                uploaded_bytes: 0,
                total_chunks: 0,
                uploaded_chunks: 0,
                started_at: Instant::now(),
                completed_at: None,
                error: String::new(),
            }),
        }
    }

    /// Moves the task to a new non-terminal status.
    ///
    /// Ignored once the task has finished.
    pub fn set_status(&self, status: TaskStatus) {
        let mut t = self.inner.write().unwrap();
        if !t.status.is_terminal() {
            t.status = status;
        }
    }

    /// Records the hashing result.
    pub fn set_processed(&self, file: &ProcessedFile) {
        let mut t = self.inner.write().unwrap();
        t.file_hash = file.file_hash.clone();
        t.file_name = file.file_name.clone();
        t.total_bytes = file.total_size;
        t.total_chunks = file.total_chunks;
    }

    /// Counts one acknowledged chunk and returns the new chunk count.
    pub fn record_chunk(&self, bytes: u64) -> u32 {
        let mut t = self.inner.write().unwrap();
        t.uploaded_chunks += 1;
        t.uploaded_bytes += bytes;
        t.uploaded_chunks
    }

    /// Marks the task as completed.
    pub fn complete(&self) {
        self.finish(TaskStatus::Completed, "");
    }

    /// Marks the task as failed with an error message.
    pub fn fail(&self, err: &str) {
        self.finish(TaskStatus::Failed, err);
    }

    /// Marks the task as cancelled.
    pub fn cancel(&self) {
        self.finish(TaskStatus::Cancelled, "");
    }

    fn finish(&self, status: TaskStatus, err: &str) {
        let mut t = self.inner.write().unwrap();
        if t.status.is_terminal() {
            return;
        }
        t.status = status;
        t.error = err.to_string();
        t.completed_at = Some(Instant::now());
    }

    /// Returns a snapshot of the task.
    pub fn progress(&self) -> TaskProgress {
        let t = self.inner.read().unwrap();
        TaskProgress {
            task_id: t.id.clone(),
            status: t.status,
            file_name: t.file_name.clone(),
            file_hash: t.file_hash.clone(),
            total_bytes: t.total_bytes,
            uploaded_bytes: t.uploaded_bytes,
            total_chunks: t.total_chunks,
            uploaded_chunks: t.uploaded_chunks,
            error: t.error.clone(),
        }
    }

    /// Returns `true` until the task completes, fails or is cancelled.
    pub fn is_active(&self) -> bool {
        let t = self.inner.read().unwrap();
        !t.status.is_terminal()
    }

    pub fn id(&self) -> String {
        let t = self.inner.read().unwrap();
        t.id.clone()
    }

    pub fn status(&self) -> TaskStatus {
        let t = self.inner.read().unwrap();
        t.status
    }

    pub fn uploaded_chunks(&self) -> u32 {
        let t = self.inner.read().unwrap();
        t.uploaded_chunks
    }

    /// Time from creation to the terminal state (or now, while active).
    pub fn elapsed(&self) -> std::time::Duration {
        let t = self.inner.read().unwrap();
        match t.completed_at {
            Some(done) => done.duration_since(t.started_at),
            None => t.started_at.elapsed(),
        }
    }
}

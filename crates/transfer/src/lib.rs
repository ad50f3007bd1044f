//! Chunking and hashing for content-addressed uploads.
//!
//! A file is read once, in chunk order: every chunk is fed to a single
//! SHA-256 hasher, so the whole-file digest and the ordered chunk plan come
//! out of the same pass. Chunk bytes are read back from disk at upload time.

mod chunked;
mod process;
mod progress;
mod types;
mod validation;

pub use chunked::{ChunkReader, checksum_bytes, chunk_count, plan_chunks, read_chunk};
pub use process::{ProcessOptions, ProcessingHandle, process_file, spawn_job, spawn_processing};
pub use progress::SpeedCalculator;
pub use types::{Chunk, ChunkSpan, ProcessedFile, UploadTask};
pub use validation::upload_file_name;

pub use chunkup_protocol::constants::DEFAULT_CHUNK_SIZE;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid chunk size: {0}")]
    InvalidChunkSize(u64),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("too many chunks: {0}")]
    TooManyChunks(u64),

    #[error("cancelled")]
    Cancelled,

    #[error("processing task failed: {0}")]
    Worker(String),
}

use std::time::Duration;

/// Default chunk size (2 MiB).
pub const DEFAULT_CHUNK_SIZE: u64 = 2 * 1024 * 1024;

/// Default number of chunk uploads allowed in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Timeout for a single HTTP request (check, chunk or merge).
///
/// Chunk uploads dominate; a 2 MiB body over a slow uplink needs headroom.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Default path of the existence-check endpoint.
pub const CHECK_PATH: &str = "/upload/check";

/// Default path of the chunk-upload endpoint.
pub const CHUNK_PATH: &str = "/upload/chunk";

/// Default path of the merge endpoint.
pub const MERGE_PATH: &str = "/upload/merge";

/// Multipart form field names sent with every chunk upload.
pub mod fields {
    /// Raw chunk bytes.
    pub const CHUNK: &str = "chunk";
    /// Chunk identifier, `{fileHash}-{index}`.
    pub const HASH: &str = "hash";
    pub const FILE_HASH: &str = "fileHash";
    pub const FILE_NAME: &str = "fileName";
    /// Decimal string.
    pub const CHUNK_INDEX: &str = "chunkIndex";
    /// Decimal string.
    pub const TOTAL_CHUNKS: &str = "totalChunks";

    /// All text fields in the order they are appended to the form.
    pub const TEXT_FIELDS: [&str; 5] = [HASH, FILE_HASH, FILE_NAME, CHUNK_INDEX, TOTAL_CHUNKS];
}

/// Builds the identifier of a chunk: `{file_hash}-{index}`.
pub fn chunk_id(file_hash: &str, index: u32) -> String {
    format!("{file_hash}-{index}")
}

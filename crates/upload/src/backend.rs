//! Server seam for the upload flow.
//!
//! `UploadBackend` is implemented by [`HttpBackend`](crate::HttpBackend)
//! for real servers. Using a trait keeps the orchestration decoupled from
//! transport and testable with mocks.

use std::future::Future;
use std::pin::Pin;

use chunkup_protocol::constants::fields;
use chunkup_protocol::{CheckRequest, CheckResponse, MergeRequest};
use chunkup_transfer::Chunk;

use crate::error::UploadError;

/// Boxed, sendable future returned by [`UploadBackend`] methods.
pub type BackendFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, UploadError>> + Send + 'a>>;

/// Abstract connection to an upload server.
pub trait UploadBackend: Send + Sync {
    /// Asks whether content with `req.file_hash` is already stored.
    fn check_exists<'a>(&'a self, req: &'a CheckRequest) -> BackendFuture<'a, CheckResponse>;

    /// Uploads one chunk. Any `Ok` counts as acknowledged.
    fn upload_chunk<'a>(&'a self, upload: ChunkUpload<'a>) -> BackendFuture<'a, ()>;

    /// Asks the server to assemble the uploaded chunks.
    fn merge<'a>(&'a self, req: &'a MergeRequest) -> BackendFuture<'a, ()>;
}

/// Everything sent with a single chunk.
#[derive(Debug, Clone, Copy)]
pub struct ChunkUpload<'a> {
    pub file_hash: &'a str,
    pub file_name: &'a str,
    pub total_chunks: u32,
    pub chunk: &'a Chunk,
}

impl ChunkUpload<'_> {
    /// Chunk identifier, `{fileHash}-{index}`.
    pub fn id(&self) -> String {
        self.chunk.id(self.file_hash)
    }

    /// Text form fields in wire order; the binary `chunk` part is separate.
    pub fn text_fields(&self) -> [(&'static str, String); 5] {
        [
            (fields::HASH, self.id()),
            (fields::FILE_HASH, self.file_hash.to_string()),
            (fields::FILE_NAME, self.file_name.to_string()),
            (fields::CHUNK_INDEX, self.chunk.index.to_string()),
            (fields::TOTAL_CHUNKS, self.total_chunks.to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_fields_are_string_encoded() {
        let chunk = Chunk {
            index: 7,
            start: 14,
            end: 16,
            data: b"xy".to_vec().into(),
        };
        let upload = ChunkUpload {
            file_hash: "feed",
            file_name: "clip.mp4",
            total_chunks: 8,
            chunk: &chunk,
        };

        assert_eq!(upload.id(), "feed-7");
        let fields = upload.text_fields();
        assert_eq!(fields[0], ("hash", "feed-7".to_string()));
        assert_eq!(fields[1], ("fileHash", "feed".to_string()));
        assert_eq!(fields[2], ("fileName", "clip.mp4".to_string()));
        assert_eq!(fields[3], ("chunkIndex", "7".to_string()));
        assert_eq!(fields[4], ("totalChunks", "8".to_string()));
    }
}

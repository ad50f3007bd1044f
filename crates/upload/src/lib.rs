//! Content-addressed chunked upload flow.
//!
//! This crate implements the **client logic** for uploading a file in
//! chunks. It talks to the server only through the [`UploadBackend`]
//! trait; [`HttpBackend`] is the reqwest implementation, tests use mocks.
//!
//! # Pipeline
//!
//! 1. **Hash**: chunk and hash the file on a blocking thread
//! 2. **Check**: ask the server whether the content already exists
//! 3. **Upload**: send every chunk, a bounded number at a time
//! 4. **Merge**: ask the server to assemble the uploaded chunks

pub mod backend;
pub mod error;
pub mod http;
pub mod orchestrator;
pub mod progress;
pub mod types;

// Re-export primary types for convenience.
pub use backend::{ChunkUpload, UploadBackend};
pub use error::{ErrorKind, UploadError};
pub use http::{HttpBackend, HttpBackendConfig};
pub use orchestrator::UploadOrchestrator;
pub use progress::{Phase, ProgressReporter, ProgressView};
pub use types::{UploadEvent, UploadOptions, UploadOutcome};

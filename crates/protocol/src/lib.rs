pub mod constants;
pub mod messages;
pub mod types;
pub mod worker;

// Re-export primary types for convenience.
pub use messages::{CheckRequest, CheckResponse, MergeRequest, MergeResponse};
pub use types::{TaskProgress, TaskStatus};
pub use worker::{ProgressEvent, WorkerMessage, WorkerRequest};

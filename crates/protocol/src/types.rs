use serde::{Deserialize, Serialize};

/// Lifecycle of a single upload task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Hashing,
    Checking,
    Uploading,
    Merging,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    /// Returns `true` once the task can no longer change state.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// Snapshot of an upload task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskProgress {
    pub task_id: String,
    pub status: TaskStatus,
    pub file_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub file_hash: String,
    pub total_bytes: u64,
    pub uploaded_bytes: u64,
    pub total_chunks: u32,
    pub uploaded_chunks: u32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

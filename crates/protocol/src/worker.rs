//! Messages exchanged with the background chunking/hashing task.

use serde::{Deserialize, Serialize};

/// Job description handed to the background task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerRequest {
    pub file_name: String,
    pub chunk_size: u64,
}

/// Chunking progress: `current` of `total` chunks produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub current: u32,
    pub total: u32,
    /// Rounded to the nearest integer, 0-100.
    pub percent: u8,
}

impl ProgressEvent {
    /// Builds an event, rounding `current / total * 100` half-up.
    ///
    /// `current == total` always yields exactly 100; an empty job (`total == 0`)
    /// counts as finished.
    pub fn new(current: u32, total: u32) -> Self {
        let percent = if total == 0 {
            100
        } else {
            let current = u64::from(current.min(total));
            let total = u64::from(total);
            ((current * 100 + total / 2) / total) as u8
        };
        Self {
            current,
            total,
            percent,
        }
    }
}

/// Outbound messages from the background task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkerMessage {
    Progress(ProgressEvent),
    #[serde(rename_all = "camelCase")]
    Complete {
        file_hash: String,
        file_name: String,
        total_size: u64,
        total_chunks: u32,
        /// Byte length of each chunk, in index order.
        chunk_sizes: Vec<u64>,
    },
    Error {
        error: String,
    },
}

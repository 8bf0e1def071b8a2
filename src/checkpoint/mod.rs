//! Per-thread history snapshots.

pub mod file;
pub mod memory;

pub use file::FileCheckpointStore;
pub use memory::MemoryCheckpointStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::Message;

/// The saved history of one thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub thread_id: String,
    pub history: Vec<Message>,
    pub saved_at: DateTime<Utc>,
}

impl Checkpoint {
    pub fn new(thread_id: impl Into<String>, history: Vec<Message>) -> Self {
        Self {
            thread_id: thread_id.into(),
            history,
            saved_at: Utc::now(),
        }
    }
}

/// Storage abstraction for thread checkpoints.
///
/// `save` replaces the previous snapshot as a whole; readers never observe
/// a partially written history.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// History saved for `thread_id`, or empty when there is none.
    async fn load(&self, thread_id: &str) -> Result<Vec<Message>>;

    /// Replace the snapshot for `thread_id`.
    async fn save(&self, thread_id: &str, history: &[Message]) -> Result<()>;
}

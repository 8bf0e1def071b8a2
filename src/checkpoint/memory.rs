use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Checkpoint, CheckpointStore};
use crate::error::Result;
use crate::types::Message;

/// In-process checkpoints. Lost on restart.
#[derive(Debug, Default)]
pub struct MemoryCheckpointStore {
    entries: RwLock<HashMap<String, Checkpoint>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full checkpoint record, including when it was saved.
    pub async fn get(&self, thread_id: &str) -> Option<Checkpoint> {
        self.entries.read().await.get(thread_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn load(&self, thread_id: &str) -> Result<Vec<Message>> {
        Ok(self
            .entries
            .read()
            .await
            .get(thread_id)
            .map(|c| c.history.clone())
            .unwrap_or_default())
    }

    async fn save(&self, thread_id: &str, history: &[Message]) -> Result<()> {
        self.entries.write().await.insert(
            thread_id.to_string(),
            Checkpoint::new(thread_id, history.to_vec()),
        );
        Ok(())
    }
}

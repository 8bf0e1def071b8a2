//! Conversation log: the user-facing record of a thread.
//!
//! Unlike checkpoints, the log only ever holds user and assistant messages.
//! The engine appends the user message when a turn is submitted and the
//! reply when it completes.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::types::Message;

#[async_trait]
pub trait ConversationLog: Send + Sync {
    async fn append(&self, thread_id: &str, message: Message) -> Result<()>;

    /// Messages of `thread_id` in append order. Empty when unknown.
    async fn load_history(&self, thread_id: &str) -> Result<Vec<Message>>;
}

#[derive(Debug, Default)]
pub struct MemoryConversationLog {
    threads: RwLock<HashMap<String, Vec<Message>>>,
}

impl MemoryConversationLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationLog for MemoryConversationLog {
    async fn append(&self, thread_id: &str, message: Message) -> Result<()> {
        self.threads
            .write()
            .await
            .entry(thread_id.to_string())
            .or_default()
            .push(message);
        Ok(())
    }

    async fn load_history(&self, thread_id: &str) -> Result<Vec<Message>> {
        Ok(self
            .threads
            .read()
            .await
            .get(thread_id)
            .cloned()
            .unwrap_or_default())
    }
}

//! Model provider trait and the Groq chat-completions client.

pub mod groq;
pub mod http;

pub use groq::GroqProvider;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::error::ThreadlineError;
use crate::types::{GenerationSettings, Message, TextStreamDelta};

/// A request sent to a model provider.
#[derive(Debug, Clone, Default)]
pub struct ProviderRequest {
    pub messages: Vec<Message>,
    pub settings: GenerationSettings,
    pub tools: Option<Vec<ToolDefinition>>,
}

/// Tool definition sent to the provider API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// A streaming chat model.
///
/// `stream_text` resolves once the response is open, so connection and
/// status failures surface there and may be retried. Deltas arrive in
/// order: text as it is produced, then every tool call fully assembled,
/// then a single `Done`.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Provider name (e.g. "groq").
    fn provider_name(&self) -> &str;

    /// The model ID this provider instance serves.
    fn model_id(&self) -> &str;

    /// Generate text (streaming).
    async fn stream_text(
        &self,
        request: &ProviderRequest,
    ) -> Result<BoxStream<'static, Result<TextStreamDelta, ThreadlineError>>, ThreadlineError>;
}

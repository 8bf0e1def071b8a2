//! Convenience re-exports for common use.

pub use crate::agent_loop::{AgentEngine, EngineOptions, TurnOutcome, TurnRequest, TurnStatus};
pub use crate::checkpoint::{CheckpointStore, FileCheckpointStore, MemoryCheckpointStore};
pub use crate::config::{EngineConfig, ToolCallPolicy};
pub use crate::error::{Result, ThreadlineError};
pub use crate::provider::{GroqProvider, ModelProvider, ProviderRequest};
pub use crate::stream::{StreamEvent, StreamTransport, TurnStream};
pub use crate::tools::{AgentTool, Tool, ToolArguments, ToolParameters, ToolRegistry};
pub use crate::transcript::{ConversationLog, MemoryConversationLog};
pub use crate::types::{Message, Role, TextStreamDelta, ToolCall, ToolResult};

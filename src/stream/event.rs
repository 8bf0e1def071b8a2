use serde::{Deserialize, Serialize};

/// One client-visible event. Serialized independently, tagged by `"type"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// The turn started and the stream is live.
    Connected,
    /// A fragment of assistant text.
    Token { token: String },
    /// A tool call is about to run.
    ToolStart {
        tool: String,
        input: serde_json::Value,
    },
    /// A tool call finished.
    ToolEnd {
        tool: String,
        output: String,
        #[serde(default)]
        is_error: bool,
    },
    /// The turn failed. Always the last event.
    Error { error: String },
    /// The turn completed. Always the last event.
    Done,
}

impl StreamEvent {
    /// Whether nothing can follow this event.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error { .. })
    }
}

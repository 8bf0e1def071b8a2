//! Generation settings and related enums.

use bon::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Settings controlling text generation.
#[derive(Debug, Clone, Builder, Serialize, Deserialize, Default, PartialEq)]
pub struct GenerationSettings {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub stop_sequences: Option<Vec<String>>,
    pub seed: Option<u64>,
    pub user: Option<String>,
    /// Abort a model stream that stays silent this long.
    pub stream_idle_timeout_ms: Option<u64>,
}

/// Why generation finished.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
    Error,
}

impl FinishReason {
    /// Parse a chat-completions `finish_reason` string.
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "function_call" => Some(Self::ToolCalls),
            other => other.parse().ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_optional_fields() {
        let settings = GenerationSettings::builder()
            .temperature(0.7)
            .max_tokens(4096)
            .build();
        assert_eq!(settings.temperature, Some(0.7));
        assert_eq!(settings.max_tokens, Some(4096));
        assert_eq!(settings.top_p, None);
    }

    #[test]
    fn finish_reason_parses_wire_values() {
        assert_eq!(FinishReason::from_wire("stop"), Some(FinishReason::Stop));
        assert_eq!(
            FinishReason::from_wire("tool_calls"),
            Some(FinishReason::ToolCalls)
        );
        assert_eq!(
            FinishReason::from_wire("function_call"),
            Some(FinishReason::ToolCalls)
        );
        assert_eq!(FinishReason::from_wire("mystery"), None);
    }
}

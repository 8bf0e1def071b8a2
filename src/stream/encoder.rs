//! Maps engine transitions to [`StreamEvent`]s and events to SSE frames.

use bytes::Bytes;

use super::event::StreamEvent;
use crate::error::{Result, ThreadlineError};
use crate::types::{ToolCall, ToolResult};

/// A state-machine transition worth telling the client about.
#[derive(Debug, Clone, Copy)]
pub enum AgentTransition<'a> {
    Started,
    TokenGenerated(&'a str),
    ToolsRequested(&'a [ToolCall]),
    ToolResolved(&'a ToolResult),
    Completed,
    Failed(&'a ThreadlineError),
}

/// Client events for one transition, in emission order.
pub fn events_for(transition: &AgentTransition<'_>) -> Vec<StreamEvent> {
    match *transition {
        AgentTransition::Started => vec![StreamEvent::Connected],
        AgentTransition::TokenGenerated("") => Vec::new(),
        AgentTransition::TokenGenerated(token) => vec![StreamEvent::Token {
            token: token.to_string(),
        }],
        AgentTransition::ToolsRequested(calls) => calls
            .iter()
            .map(|call| StreamEvent::ToolStart {
                tool: call.name.clone(),
                input: call.arguments.clone(),
            })
            .collect(),
        AgentTransition::ToolResolved(result) => vec![StreamEvent::ToolEnd {
            tool: result.name.clone(),
            output: result.output.clone(),
            is_error: result.is_error,
        }],
        AgentTransition::Completed => vec![StreamEvent::Done],
        AgentTransition::Failed(err) => vec![StreamEvent::Error {
            error: err.to_string(),
        }],
    }
}

/// Encode one event as an SSE `data:` frame.
pub fn encode_frame(event: &StreamEvent) -> Result<Bytes> {
    let json = serde_json::to_string(event)?;
    Ok(Bytes::from(format!("data: {json}\n\n")))
}

/// Decode one `data:` frame produced by [`encode_frame`].
pub fn decode_frame(frame: &str) -> Result<StreamEvent> {
    let data = frame
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(str::trim_start)
        .collect::<Vec<_>>()
        .join("\n");
    if data.is_empty() {
        return Err(ThreadlineError::Stream(format!(
            "frame has no data line: {frame:?}"
        )));
    }
    Ok(serde_json::from_str(&data)?)
}

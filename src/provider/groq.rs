//! Groq provider over the OpenAI-compatible chat-completions API.

use std::collections::BTreeMap;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest_eventsource::{Event, EventSource};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ThreadlineError;
use crate::types::*;

use super::http::{bearer_headers, shared_client, status_to_error};
use super::{ModelProvider, ProviderRequest};

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama3-8b-8192";

pub struct GroqProvider {
    model_id: String,
    api_key: String,
    base_url: String,
}

impl GroqProvider {
    pub fn new(model_id: impl Into<String>, api_key: impl Into<String>, base_url: Option<String>) -> Self {
        Self {
            model_id: model_id.into(),
            api_key: api_key.into(),
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        }
    }

    fn build_request_body(&self, request: &ProviderRequest) -> serde_json::Value {
        let messages = request
            .messages
            .iter()
            .map(message_to_wire)
            .collect::<Vec<_>>();

        let mut obj = serde_json::Map::new();
        obj.insert("model".into(), self.model_id.clone().into());
        obj.insert("messages".into(), messages.into());
        obj.insert("stream".into(), true.into());

        let settings = &request.settings;
        if let Some(max) = settings.max_tokens {
            obj.insert("max_tokens".into(), max.into());
        }
        if let Some(temp) = settings.temperature {
            obj.insert("temperature".into(), temp.into());
        }
        if let Some(top_p) = settings.top_p {
            obj.insert("top_p".into(), top_p.into());
        }
        if let Some(ref stops) = settings.stop_sequences {
            obj.insert("stop".into(), serde_json::json!(stops));
        }
        if let Some(seed) = settings.seed {
            obj.insert("seed".into(), seed.into());
        }
        if let Some(ref user) = settings.user {
            obj.insert("user".into(), user.clone().into());
        }

        if let Some(tools) = request.tools.as_ref().filter(|t| !t.is_empty()) {
            let tool_defs: Vec<serde_json::Value> = tools
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.parameters,
                        }
                    })
                })
                .collect();
            obj.insert("tools".into(), tool_defs.into());
            obj.insert("tool_choice".into(), "auto".into());
        }

        serde_json::Value::Object(obj)
    }
}

#[async_trait]
impl ModelProvider for GroqProvider {
    fn provider_name(&self) -> &str {
        "groq"
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn stream_text(
        &self,
        request: &ProviderRequest,
    ) -> Result<BoxStream<'static, Result<TextStreamDelta, ThreadlineError>>, ThreadlineError> {
        let body = self.build_request_body(request);
        let url = format!("{}/chat/completions", self.base_url);

        debug!(
            model = %self.model_id,
            messages = request.messages.len(),
            "groq stream_text"
        );

        let builder = shared_client()
            .post(&url)
            .headers(bearer_headers(&self.api_key))
            .json(&body);
        let mut source =
            EventSource::new(builder).map_err(|e| ThreadlineError::Stream(e.to_string()))?;

        // Wait for the response to open so status errors surface here.
        match source.next().await {
            Some(Ok(Event::Open)) => {}
            Some(Ok(Event::Message(message))) => {
                source.close();
                return Err(ThreadlineError::Stream(format!(
                    "unexpected event before open: {}",
                    message.event
                )));
            }
            Some(Err(err)) => {
                source.close();
                return Err(source_error(err).await);
            }
            None => {
                return Err(ThreadlineError::Stream(
                    "stream closed before opening".into(),
                ))
            }
        }

        let stream = async_stream::stream! {
            let mut calls = ToolCallAccumulator::default();
            let mut finish: Option<FinishReason> = None;
            let mut finished = false;

            while let Some(event) = source.next().await {
                let message = match event {
                    Ok(Event::Open) => continue,
                    Ok(Event::Message(message)) => message,
                    Err(reqwest_eventsource::Error::StreamEnded) => break,
                    Err(err) => {
                        source.close();
                        yield Err(source_error(err).await);
                        return;
                    }
                };

                let data = message.data.trim();
                if data == "[DONE]" {
                    finished = true;
                    break;
                }

                let chunk = match serde_json::from_str::<ChatChunk>(data) {
                    Ok(chunk) => chunk,
                    Err(err) => {
                        source.close();
                        yield Err(ThreadlineError::Serialization(err));
                        return;
                    }
                };
                if let Some(error) = chunk.error {
                    source.close();
                    yield Err(ThreadlineError::Stream(error.message));
                    return;
                }

                for choice in chunk.choices.into_iter().take(1) {
                    if let Some(delta) = choice.delta {
                        if let Some(text) = delta.content.filter(|t| !t.is_empty()) {
                            yield Ok(TextStreamDelta::text(text));
                        }
                        for fragment in delta.tool_calls.unwrap_or_default() {
                            calls.push(fragment);
                        }
                    }
                    if let Some(reason) = choice.finish_reason.as_deref() {
                        finish = FinishReason::from_wire(reason);
                        finished = true;
                    }
                }
            }
            source.close();

            if !finished {
                yield Err(ThreadlineError::Stream(
                    "model stream ended before a finish reason".into(),
                ));
                return;
            }
            for call in calls.finish() {
                yield Ok(TextStreamDelta::tool_call(call));
            }
            yield Ok(TextStreamDelta::done(finish));
        };

        Ok(Box::pin(stream))
    }
}

async fn source_error(err: reqwest_eventsource::Error) -> ThreadlineError {
    use reqwest_eventsource::Error;
    match err {
        Error::InvalidStatusCode(status, response) => {
            let headers = response.headers().clone();
            let body = response.text().await.unwrap_or_default();
            status_to_error(status.as_u16(), &headers, &body)
        }
        Error::InvalidContentType(content_type, response) => {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            if status >= 400 {
                status_to_error(status, &reqwest::header::HeaderMap::new(), &body)
            } else {
                ThreadlineError::Stream(format!(
                    "unexpected content type: {}",
                    content_type.to_str().unwrap_or("<binary>")
                ))
            }
        }
        Error::Transport(err) => ThreadlineError::Network(err),
        other => ThreadlineError::Stream(other.to_string()),
    }
}

/// Assembles streamed tool-call fragments, keyed by their index.
#[derive(Debug, Default)]
pub(crate) struct ToolCallAccumulator {
    partial: BTreeMap<usize, PartialToolCall>,
}

#[derive(Debug, Default)]
struct PartialToolCall {
    id: Option<String>,
    name: String,
    arguments: String,
}

impl ToolCallAccumulator {
    fn push(&mut self, fragment: ToolCallFragment) {
        let entry = self.partial.entry(fragment.index).or_default();
        if let Some(id) = fragment.id.filter(|id| !id.is_empty()) {
            entry.id = Some(id);
        }
        if let Some(function) = fragment.function {
            if let Some(name) = function.name {
                entry.name.push_str(&name);
            }
            if let Some(arguments) = function.arguments {
                entry.arguments.push_str(&arguments);
            }
        }
    }

    /// Completed calls in index order. Fragments without a name are dropped.
    fn finish(self) -> Vec<ToolCall> {
        self.partial
            .into_values()
            .filter_map(|partial| {
                if partial.name.is_empty() {
                    warn!("dropping tool call fragment without a name");
                    return None;
                }
                let arguments = if partial.arguments.trim().is_empty() {
                    serde_json::json!({})
                } else {
                    serde_json::from_str(&partial.arguments)
                        .unwrap_or(serde_json::Value::String(partial.arguments))
                };
                Some(ToolCall {
                    id: partial
                        .id
                        .unwrap_or_else(|| format!("call_{}", uuid::Uuid::new_v4().simple())),
                    name: partial.name,
                    arguments,
                })
            })
            .collect()
    }
}

fn message_to_wire(msg: &Message) -> serde_json::Value {
    match msg.role {
        Role::Tool => serde_json::json!({
            "role": "tool",
            "tool_call_id": msg.tool_call_id,
            "name": msg.name,
            "content": msg.content,
        }),
        Role::Assistant if msg.has_tool_calls() => {
            let tool_calls: Vec<serde_json::Value> = msg
                .tool_calls
                .iter()
                .map(|tc| {
                    serde_json::json!({
                        "id": tc.id,
                        "type": "function",
                        "function": {
                            "name": tc.name,
                            "arguments": tc.arguments.to_string(),
                        }
                    })
                })
                .collect();
            serde_json::json!({
                "role": "assistant",
                "content": if msg.content.is_empty() {
                    serde_json::Value::Null
                } else {
                    serde_json::Value::String(msg.content.clone())
                },
                "tool_calls": tool_calls,
            })
        }
        role => serde_json::json!({ "role": role.to_string(), "content": msg.content }),
    }
}

// Chat-completions stream chunk types (internal)

#[derive(Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    error: Option<ChunkError>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    delta: Option<ChunkDelta>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChunkDelta {
    content: Option<String>,
    tool_calls: Option<Vec<ToolCallFragment>>,
}

#[derive(Deserialize)]
struct ToolCallFragment {
    #[serde(default)]
    index: usize,
    id: Option<String>,
    function: Option<FunctionFragment>,
}

#[derive(Deserialize)]
struct FunctionFragment {
    name: Option<String>,
    arguments: Option<String>,
}

#[derive(Deserialize)]
struct ChunkError {
    message: String,
}

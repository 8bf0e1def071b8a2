//! Shared test helpers and a scripted model provider.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use tokio::sync::Notify;

use threadline::agent_loop::{AgentEngine, EngineOptions};
use threadline::checkpoint::MemoryCheckpointStore;
use threadline::error::ThreadlineError;
use threadline::provider::{ModelProvider, ProviderRequest};
use threadline::stream::{StreamEvent, TurnStream};
use threadline::tools::{AgentTool, Tool, ToolParameters, ToolRegistry};
use threadline::transcript::MemoryConversationLog;
use threadline::types::{FinishReason, TextStreamDelta, ToolCall};
use threadline::util::retry::RetryPolicy;

/// What one `stream_text` call produces.
pub enum Script {
    /// Stream these items, then end.
    Deltas(Vec<Result<TextStreamDelta, ThreadlineError>>),
    /// Stream these items, then never produce anything again.
    DeltasThenHang(Vec<TextStreamDelta>),
    /// Stream these items, then finish only after `gate` is notified.
    Gated(Vec<TextStreamDelta>, Arc<Notify>),
    /// Fail to open the stream.
    OpenError(ThreadlineError),
}

/// A provider that replays queued scripts, one per model call.
pub struct ScriptedProvider {
    scripts: Mutex<VecDeque<Script>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, script: Script) -> &Self {
        self.scripts.lock().unwrap().push_back(script);
        self
    }

    /// Queue a plain answer streamed as the given tokens.
    pub fn queue_text(&self, tokens: &[&str]) -> &Self {
        self.push(Script::Deltas(text_deltas(tokens)))
    }

    /// Queue a step requesting one tool call.
    pub fn queue_tool_call(&self, id: &str, name: &str, args: serde_json::Value) -> &Self {
        self.queue_tool_calls(vec![call(id, name, args)])
    }

    /// Queue a step requesting several tool calls at once.
    pub fn queue_tool_calls(&self, calls: Vec<ToolCall>) -> &Self {
        let mut deltas: Vec<_> = calls
            .into_iter()
            .map(|c| Ok(TextStreamDelta::tool_call(c)))
            .collect();
        deltas.push(Ok(TextStreamDelta::done(Some(FinishReason::ToolCalls))));
        self.push(Script::Deltas(deltas))
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_id(&self) -> &str {
        "scripted-model"
    }

    async fn stream_text(
        &self,
        request: &ProviderRequest,
    ) -> Result<BoxStream<'static, Result<TextStreamDelta, ThreadlineError>>, ThreadlineError> {
        self.requests.lock().unwrap().push(request.clone());
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Script::Deltas(text_deltas(&["Mock response"])));

        match script {
            Script::Deltas(items) => Ok(stream::iter(items).boxed()),
            Script::DeltasThenHang(items) => Ok(stream::iter(items.into_iter().map(Ok))
                .chain(stream::pending())
                .boxed()),
            Script::Gated(items, gate) => Ok(stream::iter(items.into_iter().map(Ok))
                .chain(stream::once(async move {
                    gate.notified().await;
                    Ok(TextStreamDelta::done(Some(FinishReason::Stop)))
                }))
                .boxed()),
            Script::OpenError(err) => Err(err),
        }
    }
}

pub fn text_deltas(tokens: &[&str]) -> Vec<Result<TextStreamDelta, ThreadlineError>> {
    let mut deltas: Vec<_> = tokens
        .iter()
        .map(|t| Ok(TextStreamDelta::text(*t)))
        .collect();
    deltas.push(Ok(TextStreamDelta::done(Some(FinishReason::Stop))));
    deltas
}

pub fn call(id: &str, name: &str, args: serde_json::Value) -> ToolCall {
    ToolCall {
        id: id.to_string(),
        name: name.to_string(),
        arguments: args,
    }
}

/// Tool named `name` that answers with a fixed text.
pub fn fixed_tool(name: &str, output: &'static str) -> Arc<dyn Tool> {
    Arc::new(AgentTool::new(
        name,
        "Returns a fixed answer",
        ToolParameters::object()
            .string("query", "Anything", false)
            .build(),
        move |_args, _ctx| async move { Ok(output.to_string()) },
    ))
}

/// Tool named `name` that always fails.
pub fn failing_tool(name: &str) -> Arc<dyn Tool> {
    let tool_name = name.to_string();
    Arc::new(AgentTool::new(
        name,
        "Always fails",
        ToolParameters::empty(),
        move |_args, _ctx| {
            let tool_name = tool_name.clone();
            async move { Err(ThreadlineError::tool(tool_name, "upstream exploded")) }
        },
    ))
}

/// Options suited to tests: no retry delays, a large event buffer.
pub fn test_options() -> EngineOptions {
    EngineOptions::builder()
        .retry(RetryPolicy::none())
        .system_prompt("You are a test assistant.")
        .channel_capacity(256)
        .build()
}

/// Engine plus handles to its in-memory stores.
pub struct Harness {
    pub engine: Arc<AgentEngine>,
    pub provider: Arc<ScriptedProvider>,
    pub checkpoints: Arc<MemoryCheckpointStore>,
    pub log: Arc<MemoryConversationLog>,
}

impl Harness {
    pub fn new(provider: ScriptedProvider, tools: Vec<Arc<dyn Tool>>) -> Self {
        Self::with_options(provider, tools, test_options())
    }

    pub fn with_options(
        provider: ScriptedProvider,
        tools: Vec<Arc<dyn Tool>>,
        options: EngineOptions,
    ) -> Self {
        let provider = Arc::new(provider);
        let checkpoints = Arc::new(MemoryCheckpointStore::new());
        let log = Arc::new(MemoryConversationLog::new());
        let engine = Arc::new(AgentEngine::new(
            provider.clone(),
            ToolRegistry::from_tools(tools),
            checkpoints.clone(),
            log.clone(),
            options,
        ));
        Self {
            engine,
            provider,
            checkpoints,
            log,
        }
    }
}

/// Drain a turn stream into decoded events.
pub async fn collect_events(stream: TurnStream) -> Vec<StreamEvent> {
    stream
        .into_events()
        .map(|event| event.expect("frame decodes"))
        .collect()
        .await
}

/// Concatenated payload of every `Token` event.
pub fn tokens(events: &[StreamEvent]) -> String {
    events
        .iter()
        .filter_map(|event| match event {
            StreamEvent::Token { token } => Some(token.as_str()),
            _ => None,
        })
        .collect()
}

/// Wait until the engine has released `thread_id`.
pub async fn wait_until_idle(engine: &AgentEngine, thread_id: &str) {
    for _ in 0..200 {
        if !engine.locks().is_busy(thread_id) {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    panic!("thread {thread_id} still busy");
}

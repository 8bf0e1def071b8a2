//! Reasoning/acting state machine driving one turn at a time per thread.

use std::sync::Arc;
use std::time::Duration;

use bon::Builder;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::locks::{ThreadGuard, ThreadLocks};
use super::state::{AgentState, Phase, TurnOutcome};
use super::trimmer::HistoryTrimmer;
use crate::checkpoint::{CheckpointStore, FileCheckpointStore, MemoryCheckpointStore};
use crate::config::{EngineConfig, ToolCallPolicy, SYSTEM_PROMPT};
use crate::error::{Result, TerminationReason, ThreadlineError};
use crate::provider::{GroqProvider, ModelProvider, ProviderRequest, ToolDefinition};
use crate::stream::{events_for, AgentTransition, StreamTransport, TurnStream};
use crate::tools::{builtin, ToolExecutionContext, ToolInvoker, ToolRegistry};
use crate::transcript::{ConversationLog, MemoryConversationLog};
use crate::types::{
    GenerationSettings, Message, Role, StreamEventType, TextStreamDelta, ToolCall,
};
use crate::util::retry::RetryPolicy;

const DEFAULT_IDLE_TIMEOUT_MS: u64 = 120_000;

/// New input for a thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRequest {
    pub thread_id: String,
    /// Caller-held history, used only when the thread has no checkpoint.
    #[serde(default)]
    pub history: Vec<Message>,
    pub new_message: String,
}

impl TurnRequest {
    pub fn new(thread_id: impl Into<String>, new_message: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            history: Vec::new(),
            new_message: new_message.into(),
        }
    }

    pub fn with_history(mut self, history: Vec<Message>) -> Self {
        self.history = history;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.thread_id.trim().is_empty() {
            return Err(ThreadlineError::InvalidArgument(
                "thread id must not be empty".into(),
            ));
        }
        if self.new_message.trim().is_empty() {
            return Err(ThreadlineError::InvalidArgument(
                "message must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Tunables of the loop.
#[derive(Debug, Clone, Builder)]
pub struct EngineOptions {
    /// Acting phases allowed per turn.
    #[builder(default = 25)]
    pub max_cycles: usize,
    #[builder(default)]
    pub trimmer: HistoryTrimmer,
    #[builder(default)]
    pub tool_call_policy: ToolCallPolicy,
    #[builder(default = SYSTEM_PROMPT.to_string(), into)]
    pub system_prompt: String,
    #[builder(default)]
    pub generation: GenerationSettings,
    #[builder(default)]
    pub retry: RetryPolicy,
    pub tool_timeout: Option<Duration>,
    /// Frames buffered per turn before the loop waits on the client.
    #[builder(default = 64)]
    pub channel_capacity: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl From<&EngineConfig> for EngineOptions {
    fn from(config: &EngineConfig) -> Self {
        Self::builder()
            .max_cycles(config.max_cycles)
            .trimmer(HistoryTrimmer::new(config.history_budget))
            .tool_call_policy(config.tool_call_policy)
            .system_prompt(config.system_prompt.clone())
            .generation(config.generation_settings())
            .retry(RetryPolicy {
                max_attempts: config.connect_attempts,
                ..RetryPolicy::default()
            })
            .maybe_tool_timeout((config.tool_timeout_secs > 0).then(|| config.tool_timeout()))
            .channel_capacity(config.channel_capacity)
            .build()
    }
}

/// Runs turns: trims history, calls the model, executes requested tools,
/// streams events, and persists successful turns.
///
/// Build one per process and share it behind an `Arc`.
pub struct AgentEngine {
    provider: Arc<dyn ModelProvider>,
    invoker: ToolInvoker,
    tool_definitions: Vec<ToolDefinition>,
    checkpoints: Arc<dyn CheckpointStore>,
    log: Arc<dyn ConversationLog>,
    locks: ThreadLocks,
    options: EngineOptions,
}

/// Model output of one reasoning step.
#[derive(Debug, Default)]
struct Step {
    text: String,
    calls: Vec<ToolCall>,
}

impl AgentEngine {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        registry: ToolRegistry,
        checkpoints: Arc<dyn CheckpointStore>,
        log: Arc<dyn ConversationLog>,
        options: EngineOptions,
    ) -> Self {
        let tool_definitions = registry.definitions();
        let invoker = match options.tool_timeout {
            Some(limit) => ToolInvoker::new(registry).with_timeout(limit),
            None => ToolInvoker::new(registry),
        };
        Self {
            provider,
            invoker,
            tool_definitions,
            checkpoints,
            log,
            locks: ThreadLocks::new(),
            options,
        }
    }

    /// Wire the Groq provider, the built-in tools and the configured stores.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let api_key = config
            .groq_api_key
            .clone()
            .ok_or_else(|| ThreadlineError::Configuration("GROQ_API_KEY is not set".into()))?;
        let provider = GroqProvider::new(
            config.model.clone(),
            api_key,
            Some(config.groq_base_url.clone()),
        );
        let registry = ToolRegistry::from_tools(builtin::all_tools(&config.tools));
        let checkpoints: Arc<dyn CheckpointStore> = match &config.checkpoint_dir {
            Some(dir) => Arc::new(FileCheckpointStore::new(dir.clone())),
            None => Arc::new(MemoryCheckpointStore::new()),
        };
        Ok(Self::new(
            Arc::new(provider),
            registry,
            checkpoints,
            Arc::new(MemoryConversationLog::new()),
            EngineOptions::from(config),
        ))
    }

    pub fn registry(&self) -> &ToolRegistry {
        self.invoker.registry()
    }

    pub fn tool_definitions(&self) -> &[ToolDefinition] {
        &self.tool_definitions
    }

    pub fn locks(&self) -> &ThreadLocks {
        &self.locks
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Claim the thread and run the turn in a background task.
    ///
    /// Fails before any event is produced when the request is invalid or the
    /// thread already has a turn in flight. Dropping the returned stream
    /// cancels the turn.
    pub fn start(self: &Arc<Self>, request: TurnRequest) -> Result<TurnStream> {
        let guard = self.admit(&request)?;
        let (mut transport, stream) = StreamTransport::channel(self.options.channel_capacity);
        let cancel = CancellationToken::new();

        let disconnected = transport.closed();
        let watch = cancel.clone();
        let thread_id = request.thread_id.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = disconnected => {
                    debug!(%thread_id, "client disconnected");
                    watch.cancel();
                }
                _ = watch.cancelled() => {}
            }
        });

        let engine = Arc::clone(self);
        tokio::spawn(async move {
            let _finished = cancel.clone().drop_guard();
            engine.drive(request, guard, &mut transport, &cancel).await;
        });
        Ok(stream)
    }

    /// Run one turn to completion on the caller's task.
    pub async fn run_turn(
        &self,
        request: TurnRequest,
        transport: &mut StreamTransport,
        cancel: &CancellationToken,
    ) -> TurnOutcome {
        match self.admit(&request) {
            Ok(guard) => self.drive(request, guard, transport, cancel).await,
            Err(err) => {
                let _ = self.emit(transport, AgentTransition::Failed(&err)).await;
                transport.close();
                TurnOutcome::terminated(err.termination_reason(), 0, err.to_string())
            }
        }
    }

    fn admit(&self, request: &TurnRequest) -> Result<ThreadGuard> {
        request.validate()?;
        self.locks.try_acquire(&request.thread_id)
    }

    async fn drive(
        &self,
        request: TurnRequest,
        guard: ThreadGuard,
        transport: &mut StreamTransport,
        cancel: &CancellationToken,
    ) -> TurnOutcome {
        info!(thread_id = %request.thread_id, model = self.provider.model_id(), "turn started");
        let mut state = AgentState::new(request.thread_id.clone(), Vec::new());

        let outcome = match self.execute(request, &mut state, transport, cancel).await {
            Ok(reply) => self.finish(&mut state, reply, transport, cancel).await,
            Err(err) => self.abort(&mut state, err, transport, cancel).await,
        };
        transport.close();
        drop(guard);

        info!(
            thread_id = %state.thread_id,
            status = %outcome.status,
            cycles = outcome.cycles,
            "turn finished"
        );
        outcome
    }

    /// Reasoning/acting loop. Returns the reply once a step requests no tools.
    async fn execute(
        &self,
        request: TurnRequest,
        state: &mut AgentState,
        transport: &mut StreamTransport,
        cancel: &CancellationToken,
    ) -> Result<String> {
        self.emit(transport, AgentTransition::Started).await?;

        state.history = self.base_history(&request).await?;
        self.log
            .append(&state.thread_id, Message::user(request.new_message.clone()))
            .await?;
        state.history.push(Message::user(request.new_message));
        let live_index = state.history.len() - 1;

        let mut reply = String::new();
        loop {
            state.enter(Phase::Reasoning);
            let step = self
                .reason(state, live_index, transport, cancel, &mut reply)
                .await?;

            if step.calls.is_empty() {
                state.history.push(Message::assistant(step.text));
                return Ok(reply);
            }
            if state.cycle_count + 1 > self.options.max_cycles {
                return Err(ThreadlineError::CycleLimitExceeded {
                    max_cycles: self.options.max_cycles,
                });
            }

            let calls = self.select_calls(state, step.calls);
            self.emit(transport, AgentTransition::ToolsRequested(&calls))
                .await?;

            state.enter(Phase::Acting);
            state
                .history
                .push(Message::assistant_with_tool_calls(step.text, calls.clone()));
            for call in &calls {
                let ctx = ToolExecutionContext::for_call(&state.thread_id, &call.id);
                let result = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(ThreadlineError::Canceled),
                    result = self.invoker.invoke(call, &ctx) => result,
                };
                debug!(
                    thread_id = %state.thread_id,
                    cycle = state.cycle_count,
                    tool = %call.name,
                    is_error = result.is_error,
                    "tool resolved"
                );
                state.history.push(Message::tool_result(&result));
                self.emit(transport, AgentTransition::ToolResolved(&result))
                    .await?;
            }
            state.cycle_count += 1;
        }
    }

    /// One model call: stream tokens live, collect complete tool calls.
    async fn reason(
        &self,
        state: &AgentState,
        live_index: usize,
        transport: &mut StreamTransport,
        cancel: &CancellationToken,
        reply: &mut String,
    ) -> Result<Step> {
        let window = self.options.trimmer.trim(&state.history, live_index);
        debug!(
            thread_id = %state.thread_id,
            cycle = state.cycle_count,
            kept = window.len(),
            total = state.history.len(),
            "history trimmed"
        );

        let mut messages = Vec::with_capacity(window.len() + 1);
        messages.push(Message::system(self.options.system_prompt.clone()));
        messages.extend_from_slice(window);
        let request = ProviderRequest {
            messages,
            settings: self.options.generation.clone(),
            tools: (!self.tool_definitions.is_empty()).then(|| self.tool_definitions.clone()),
        };

        let mut stream = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ThreadlineError::Canceled),
            opened = self.options.retry.execute(|| self.provider.stream_text(&request)) => opened?,
        };

        let idle_ms = self
            .options
            .generation
            .stream_idle_timeout_ms
            .unwrap_or(DEFAULT_IDLE_TIMEOUT_MS);
        let mut step = Step::default();
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ThreadlineError::Canceled),
                next = next_delta(&mut stream, idle_ms) => next?,
            };
            let Some(delta) = next else { break };

            match delta.event_type {
                StreamEventType::TextDelta => {
                    if delta.text.is_empty() {
                        continue;
                    }
                    step.text.push_str(&delta.text);
                    reply.push_str(&delta.text);
                    self.emit(transport, AgentTransition::TokenGenerated(&delta.text))
                        .await?;
                }
                StreamEventType::ToolCallDelta => {
                    if let Some(call) = delta.tool_call {
                        step.calls.push(call);
                    }
                }
                StreamEventType::Done => break,
                StreamEventType::Error => {
                    let message = if delta.text.is_empty() {
                        "model stream error".to_string()
                    } else {
                        delta.text
                    };
                    return Err(ThreadlineError::Stream(message));
                }
            }
        }

        debug!(
            thread_id = %state.thread_id,
            cycle = state.cycle_count,
            text_len = step.text.len(),
            tool_calls = step.calls.len(),
            "reasoning step complete"
        );
        Ok(step)
    }

    /// Checkpoint first; the log and stream only hear about persisted turns.
    async fn finish(
        &self,
        state: &mut AgentState,
        reply: String,
        transport: &mut StreamTransport,
        cancel: &CancellationToken,
    ) -> TurnOutcome {
        if cancel.is_cancelled() || transport.is_disconnected() {
            return self
                .abort(state, ThreadlineError::Canceled, transport, cancel)
                .await;
        }
        if let Err(err) = self.checkpoints.save(&state.thread_id, &state.history).await {
            return self.abort(state, err, transport, cancel).await;
        }
        state.enter(Phase::Terminated(TerminationReason::Success));

        if let Err(err) = self
            .log
            .append(&state.thread_id, Message::assistant(reply.clone()))
            .await
        {
            warn!(thread_id = %state.thread_id, error = %err, "failed to log assistant reply");
        }
        if let Err(err) = self.emit(transport, AgentTransition::Completed).await {
            debug!(thread_id = %state.thread_id, error = %err, "done event not delivered");
        }
        TurnOutcome::completed(reply, state.cycle_count)
    }

    async fn abort(
        &self,
        state: &mut AgentState,
        err: ThreadlineError,
        transport: &mut StreamTransport,
        cancel: &CancellationToken,
    ) -> TurnOutcome {
        let transport_failed = matches!(err, ThreadlineError::Transport(_));
        let client_gone = transport_failed || transport.is_disconnected();
        let reason = if transport_failed && (cancel.is_cancelled() || transport.is_disconnected())
        {
            TerminationReason::Canceled
        } else {
            err.termination_reason()
        };
        state.enter(Phase::Terminated(reason));

        match reason {
            TerminationReason::Canceled if client_gone => {
                info!(thread_id = %state.thread_id, "turn canceled by disconnect");
            }
            _ if transport_failed => {
                warn!(thread_id = %state.thread_id, error = %err, "event transport failed");
            }
            _ => {
                if reason == TerminationReason::Canceled {
                    info!(thread_id = %state.thread_id, "turn canceled");
                } else {
                    warn!(thread_id = %state.thread_id, error = %err, "turn failed");
                }
                // A connected client always sees a terminal event.
                if let Err(send_err) = self.emit(transport, AgentTransition::Failed(&err)).await {
                    debug!(error = %send_err, "error event not delivered");
                }
            }
        }
        TurnOutcome::terminated(reason, state.cycle_count, err.to_string())
    }

    /// Checkpoint, else caller history, else conversation log. Never system messages.
    async fn base_history(&self, request: &TurnRequest) -> Result<Vec<Message>> {
        let saved = self.checkpoints.load(&request.thread_id).await?;
        let base = if !saved.is_empty() {
            saved
        } else if !request.history.is_empty() {
            request.history.clone()
        } else {
            self.log.load_history(&request.thread_id).await?
        };
        Ok(base.into_iter().filter(|m| m.role != Role::System).collect())
    }

    fn select_calls(&self, state: &AgentState, mut calls: Vec<ToolCall>) -> Vec<ToolCall> {
        if self.options.tool_call_policy == ToolCallPolicy::FirstOnly && calls.len() > 1 {
            let dropped: Vec<String> = calls.drain(1..).map(|call| call.name).collect();
            warn!(
                thread_id = %state.thread_id,
                kept = %calls[0].name,
                ?dropped,
                "first_only policy dropped extra tool calls"
            );
        }
        calls
    }

    async fn emit(
        &self,
        transport: &mut StreamTransport,
        transition: AgentTransition<'_>,
    ) -> Result<()> {
        for event in events_for(&transition) {
            transport.send(&event).await?;
        }
        Ok(())
    }
}

async fn next_delta(
    stream: &mut BoxStream<'static, Result<TextStreamDelta>>,
    idle_ms: u64,
) -> Result<Option<TextStreamDelta>> {
    let next = if idle_ms == 0 {
        stream.next().await
    } else {
        tokio::time::timeout(Duration::from_millis(idle_ms), stream.next())
            .await
            .map_err(|_| ThreadlineError::Timeout(idle_ms))?
    };
    next.transpose()
}

//! Tool registry and the uniform invocation interface over it.

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tracing::{debug, warn};

use super::arguments::ToolArguments;
use super::tool::{Tool, ToolExecutionContext};
use super::validation::validate_arguments;
use crate::error::ThreadlineError;
use crate::provider::ToolDefinition;
use crate::types::{ToolCall, ToolResult};
use crate::util::timeout::with_timeout;

/// Static name → tool mapping. Registration order is preserved.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a list of tools. Later duplicates replace earlier ones.
    pub fn from_tools(tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Self {
        let mut registry = Self::new();
        for tool in tools {
            registry.register(tool);
        }
        registry
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        match self.index.get(&name) {
            Some(&idx) => {
                warn!(tool = %name, "replacing previously registered tool");
                self.tools[idx] = tool;
            }
            None => {
                self.index.insert(name, self.tools.len());
                self.tools.push(tool);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.index.get(name).map(|&idx| &self.tools[idx])
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Definitions advertised to the model.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| t.definition())
            .collect()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

/// Executes tool calls by name. Never fails: every problem becomes an
/// error [`ToolResult`] whose text is fed back to the model.
#[derive(Debug, Clone)]
pub struct ToolInvoker {
    registry: ToolRegistry,
    timeout: Option<Duration>,
}

impl ToolInvoker {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry,
            timeout: None,
        }
    }

    /// Bound each tool execution.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub async fn invoke(&self, call: &ToolCall, ctx: &ToolExecutionContext) -> ToolResult {
        let Some(tool) = self.registry.get(&call.name) else {
            warn!(tool = %call.name, "model requested unknown tool");
            return ToolResult::error(
                call,
                format!(
                    "Error: tool '{}' is not available. Available tools: {}.",
                    call.name,
                    self.registry.names().join(", ")
                ),
            );
        };

        let args = ToolArguments::new(call.arguments.clone());
        if let Err(message) = validate_arguments(args.raw(), &tool.parameters().schema) {
            debug!(tool = %call.name, %message, "rejected tool arguments");
            return ToolResult::error(
                call,
                format!("Error: invalid arguments for '{}': {message}", call.name),
            );
        }

        let execution = async {
            match AssertUnwindSafe(tool.execute(&args, ctx)).catch_unwind().await {
                Ok(result) => result,
                Err(panic) => Err(ThreadlineError::tool(
                    &call.name,
                    format!("tool panicked: {}", panic_message(panic.as_ref())),
                )),
            }
        };
        let outcome = match self.timeout {
            Some(limit) => with_timeout(limit, execution).await,
            None => execution.await,
        };

        match outcome {
            Ok(output) => {
                debug!(tool = %call.name, output_len = output.len(), "tool succeeded");
                ToolResult::success(call, output)
            }
            Err(err) => {
                warn!(tool = %call.name, error = %err, "tool failed");
                ToolResult::error(call, error_text(&call.name, &err))
            }
        }
    }
}

fn error_text(tool_name: &str, err: &ThreadlineError) -> String {
    match err {
        ThreadlineError::ToolExecution { message, .. } => format!("Error: {message}"),
        ThreadlineError::Timeout(ms) => {
            format!("Error: tool '{tool_name}' timed out after {ms}ms")
        }
        other => format!("Error: {other}"),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(text) = panic.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = panic.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown panic".to_string()
    }
}

//! What the engine can call on the model's behalf.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use super::arguments::ToolArguments;
use super::types::ToolParameters;
use crate::error::ThreadlineError;
use crate::provider::ToolDefinition;

/// Which turn and which requested call an execution belongs to.
///
/// Both fields are empty when a tool runs outside a turn, e.g. from the CLI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolExecutionContext {
    pub thread_id: Option<String>,
    pub tool_call_id: Option<String>,
}

impl ToolExecutionContext {
    pub fn for_call(thread_id: impl Into<String>, tool_call_id: impl Into<String>) -> Self {
        Self {
            thread_id: Some(thread_id.into()),
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

/// A capability advertised to the model and resolved to text.
///
/// An `Err` never ends the turn: the invoker reports it back to the model
/// as an error result.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The name the model calls it by.
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters(&self) -> &ToolParameters;

    async fn execute(
        &self,
        args: &ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<String, ThreadlineError>;

    /// How the tool is advertised in a model request.
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters().schema.clone(),
        }
    }
}

type Executor = Arc<
    dyn Fn(ToolArguments, ToolExecutionContext) -> BoxFuture<'static, Result<String, ThreadlineError>>
        + Send
        + Sync,
>;

/// A [`Tool`] whose execution is an async closure. Every built-in is one.
#[derive(Clone)]
pub struct AgentTool {
    name: String,
    description: String,
    parameters: ToolParameters,
    executor: Executor,
}

impl AgentTool {
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: ToolParameters,
        executor: F,
    ) -> Self
    where
        F: Fn(ToolArguments, ToolExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, ThreadlineError>> + Send + 'static,
    {
        let executor: Executor = Arc::new(move |args, ctx| Box::pin(executor(args, ctx)));
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            executor,
        }
    }
}

#[async_trait]
impl Tool for AgentTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> &ToolParameters {
        &self.parameters
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<String, ThreadlineError> {
        (self.executor)(args.clone(), ctx.clone()).await
    }
}

impl std::fmt::Debug for AgentTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn whoami() -> AgentTool {
        AgentTool::new(
            "whoami",
            "Reports the call it serves",
            ToolParameters::empty(),
            |_args, ctx: ToolExecutionContext| async move {
                Ok(format!(
                    "{}/{}",
                    ctx.thread_id.unwrap_or_default(),
                    ctx.tool_call_id.unwrap_or_default()
                ))
            },
        )
    }

    #[tokio::test]
    async fn executor_sees_the_call_context() {
        let out = whoami()
            .execute(
                &ToolArguments::new(json!({})),
                &ToolExecutionContext::for_call("thread-1", "call_9"),
            )
            .await
            .unwrap();
        assert_eq!(out, "thread-1/call_9");
    }

    #[test]
    fn definition_carries_the_schema() {
        let definition = whoami().definition();
        assert_eq!(definition.name, "whoami");
        assert_eq!(definition.description, "Reports the call it serves");
        assert_eq!(definition.parameters, ToolParameters::empty().schema);
    }
}

//! Tests for the tool system.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use threadline::error::ThreadlineError;
use threadline::tools::builtin::jsonata::evaluate;
use threadline::tools::tool::{AgentTool, Tool, ToolExecutionContext};
use threadline::tools::*;
use threadline::types::ToolCall;

fn call(name: &str, args: serde_json::Value) -> ToolCall {
    ToolCall {
        id: "call_7".into(),
        name: name.into(),
        arguments: args,
    }
}

fn echo_tool() -> Arc<dyn Tool> {
    Arc::new(AgentTool::new(
        "echo",
        "Echo the text back",
        ToolParameters::object()
            .string("text", "What to echo", true)
            .build(),
        |args, ctx: ToolExecutionContext| async move {
            let text = args.get_str("text")?;
            Ok(format!(
                "{text} ({})",
                ctx.tool_call_id.unwrap_or_default()
            ))
        },
    ))
}

#[test]
fn parameter_builder_constructs_schema() {
    let params = ToolParameters::object()
        .string("q", "Search query", true)
        .integer("maxResults", "Max results", false)
        .string_array("fields", "Fields to keep", false)
        .build();

    let schema = &params.schema;
    assert_eq!(schema["type"], "object");
    assert_eq!(schema["properties"]["q"]["type"], "string");
    assert_eq!(schema["properties"]["maxResults"]["type"], "integer");
    assert_eq!(schema["properties"]["fields"]["items"]["type"], "string");
    assert_eq!(schema["required"], json!(["q"]));
}

#[test]
fn registry_keeps_registration_order_and_replaces_duplicates() {
    let mut registry = ToolRegistry::new();
    registry.register(echo_tool());
    registry.register(Arc::new(AgentTool::new(
        "other",
        "Other",
        ToolParameters::empty(),
        |_args, _ctx| async { Ok(String::new()) },
    )));
    registry.register(echo_tool());

    assert_eq!(registry.names(), vec!["echo", "other"]);
    assert_eq!(registry.len(), 2);
    let definitions = registry.definitions();
    assert_eq!(definitions[0].name, "echo");
    assert_eq!(definitions[0].parameters["required"], json!(["text"]));
}

#[tokio::test]
async fn invoker_runs_tool_with_context() {
    let invoker = ToolInvoker::new(ToolRegistry::from_tools([echo_tool()]));
    let ctx = ToolExecutionContext::for_call("t", "call_7");
    let result = invoker.invoke(&call("echo", json!({ "text": "hi" })), &ctx).await;

    assert!(!result.is_error);
    assert_eq!(result.output, "hi (call_7)");
    assert_eq!(result.tool_call_id, "call_7");
    assert_eq!(result.name, "echo");
}

#[tokio::test]
async fn string_encoded_arguments_are_accepted() {
    let invoker = ToolInvoker::new(ToolRegistry::from_tools([echo_tool()]));
    let result = invoker
        .invoke(
            &call("echo", json!("{\"text\":\"encoded\"}")),
            &ToolExecutionContext::default(),
        )
        .await;
    assert!(!result.is_error, "{}", result.output);
    assert!(result.output.starts_with("encoded"));
}

#[tokio::test]
async fn unknown_tool_lists_available_ones() {
    let invoker = ToolInvoker::new(ToolRegistry::from_tools([echo_tool()]));
    let result = invoker
        .invoke(&call("missing", json!({})), &ToolExecutionContext::default())
        .await;
    assert!(result.is_error);
    assert_eq!(
        result.output,
        "Error: tool 'missing' is not available. Available tools: echo."
    );
}

#[tokio::test]
async fn invalid_arguments_are_rejected_before_execution() {
    let invoker = ToolInvoker::new(ToolRegistry::from_tools([echo_tool()]));
    let result = invoker
        .invoke(&call("echo", json!({ "text": 3 })), &ToolExecutionContext::default())
        .await;
    assert!(result.is_error);
    assert!(result.output.contains("invalid arguments for 'echo'"));
}

#[tokio::test]
async fn tool_errors_become_error_text() {
    let failing: Arc<dyn Tool> = Arc::new(AgentTool::new(
        "flaky",
        "Fails",
        ToolParameters::empty(),
        |_args, _ctx| async { Err(ThreadlineError::tool("flaky", "service unavailable")) },
    ));
    let invoker = ToolInvoker::new(ToolRegistry::from_tools([failing]));
    let result = invoker
        .invoke(&call("flaky", json!({})), &ToolExecutionContext::default())
        .await;
    assert!(result.is_error);
    assert_eq!(result.output, "Error: service unavailable");
}

#[tokio::test]
async fn panics_are_captured() {
    let panicking: Arc<dyn Tool> = Arc::new(AgentTool::new(
        "boom",
        "Panics",
        ToolParameters::empty(),
        |_args, _ctx| async {
            if true {
                panic!("kaboom");
            }
            Ok(String::new())
        },
    ));
    let invoker = ToolInvoker::new(ToolRegistry::from_tools([panicking]));
    let result = invoker
        .invoke(&call("boom", json!({})), &ToolExecutionContext::default())
        .await;
    assert!(result.is_error);
    assert!(result.output.contains("tool panicked: kaboom"));
}

#[tokio::test(start_paused = true)]
async fn slow_tools_time_out() {
    let slow: Arc<dyn Tool> = Arc::new(AgentTool::new(
        "slow",
        "Sleeps",
        ToolParameters::empty(),
        |_args, _ctx| async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("late".to_string())
        },
    ));
    let invoker = ToolInvoker::new(ToolRegistry::from_tools([slow]))
        .with_timeout(Duration::from_millis(250));
    let result = invoker
        .invoke(&call("slow", json!({})), &ToolExecutionContext::default())
        .await;
    assert!(result.is_error);
    assert_eq!(result.output, "Error: tool 'slow' timed out after 250ms");
}

#[test]
fn jsonata_paths_and_aggregates() {
    let data = json!({
        "account": {
            "orders": [
                { "id": "a", "items": [{ "price": 2 }, { "price": 3 }] },
                { "id": "b", "items": [{ "price": 5.25 }] }
            ]
        }
    });

    assert_eq!(
        evaluate("account.orders.id", &data).unwrap(),
        json!(["a", "b"])
    );
    assert_eq!(evaluate("account.orders[0].id", &data).unwrap(), json!("a"));
    assert_eq!(evaluate("account.orders[-1].id", &data).unwrap(), json!("b"));
    assert_eq!(
        evaluate("account.orders[id = 'b'].items.price", &data).unwrap(),
        json!(5.25)
    );
    let total = evaluate("$sum(account.orders.items.price)", &data).unwrap();
    assert_eq!(total.as_f64(), Some(10.25));
    let count = evaluate("$count(account.orders)", &data).unwrap();
    assert_eq!(count.as_f64(), Some(2.0));
    assert_eq!(evaluate("account.missing", &data).unwrap(), json!(null));
}

#[test]
fn jsonata_reports_syntax_errors() {
    assert!(evaluate("account.orders[", &json!({})).is_err());
    assert!(evaluate("$sum(", &json!({})).is_err());
}

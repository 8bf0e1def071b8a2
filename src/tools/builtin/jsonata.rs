//! `jsonata` tool, evaluating full JSONata expressions with `jsonata-rs`.

use std::sync::Arc;

use bumpalo::Bump;
use jsonata_rs::JsonAta;
use serde_json::Value;

use crate::error::ThreadlineError;
use crate::tools::tool::{AgentTool, Tool, ToolExecutionContext};
use crate::tools::types::ToolParameters;

const TOOL: &str = "jsonata";

/// Create the `jsonata` tool.
pub fn jsonata_tool() -> Arc<dyn Tool> {
    Arc::new(AgentTool::new(
        TOOL,
        "Transform a JSON object using a JSONata expression.",
        ToolParameters::object()
            .any("data", "The input JSON object or array to be transformed.", true)
            .string("expression", "The JSONata expression to apply.", true)
            .build(),
        |args, _ctx: ToolExecutionContext| async move {
            let expression = args.get_str("expression")?;
            let data = match args.get_value("data")? {
                Value::String(raw) => serde_json::from_str(raw).unwrap_or(Value::String(raw.clone())),
                other => other.clone(),
            };
            let result = evaluate(expression, &data).map_err(|e| {
                ThreadlineError::tool(TOOL, format!("could not apply expression `{expression}`: {e}"))
            })?;
            Ok(serde_json::to_string_pretty(&result)?)
        },
    ))
}

/// Evaluate `expression` against `data`. An undefined result yields `null`.
///
/// The arena lives only for this call, so nothing here crosses an await.
pub fn evaluate(expression: &str, data: &Value) -> Result<Value, String> {
    let input = serde_json::to_string(data).map_err(|e| e.to_string())?;
    let arena = Bump::new();
    let jsonata = JsonAta::new(expression, &arena).map_err(|e| e.to_string())?;
    let result = jsonata
        .evaluate(Some(input.as_str()), None)
        .map_err(|e| e.to_string())?;
    if result.is_undefined() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&result.serialize(false)).map_err(|e| e.to_string())
}

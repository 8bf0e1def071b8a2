use std::sync::Arc;

use serde_json::{Map, Value};

use super::{parse_base, read_json, send_checked};
use crate::error::ThreadlineError;
use crate::provider::http::shared_client;
use crate::tools::tool::{AgentTool, Tool, ToolExecutionContext};
use crate::tools::types::ToolParameters;

const TOOL: &str = "curl_comments";
const SERVICE: &str = "JSONPlaceholder API";
const COMMENT_LIMIT: &str = "5";

/// Create the `curl_comments` tool. Fetches sample comments from a
/// JSONPlaceholder-style API at `base_url`.
pub fn curl_comments_tool(base_url: &str) -> Arc<dyn Tool> {
    let base_url = base_url.to_string();
    Arc::new(AgentTool::new(
        TOOL,
        "Fetch sample comments from the JSONPlaceholder API. Can optionally return only specific fields.",
        ToolParameters::object()
            .string_array(
                "fields",
                "A list of fields to return for each comment (e.g., ['name', 'email', 'body']).",
                false,
            )
            .build(),
        move |args, _ctx: ToolExecutionContext| {
            let base_url = base_url.clone();
            async move {
                let fields = args.get_str_list("fields");
                fetch_comments(&base_url, &fields).await
            }
        },
    ))
}

async fn fetch_comments(base_url: &str, fields: &[String]) -> Result<String, ThreadlineError> {
    let mut url = parse_base(TOOL, base_url)?;
    url.path_segments_mut()
        .map_err(|_| ThreadlineError::tool(TOOL, format!("invalid endpoint '{base_url}'")))?
        .pop_if_empty()
        .push("comments");

    let request = shared_client().get(url).query(&[("_limit", COMMENT_LIMIT)]);
    let response = send_checked(TOOL, SERVICE, request).await?;
    let body = read_json(TOOL, SERVICE, response).await?;
    let Value::Array(comments) = body else {
        return Err(ThreadlineError::tool(TOOL, "expected a list of comments"));
    };

    let selected: Vec<Value> = if fields.is_empty() {
        comments
    } else {
        comments
            .iter()
            .map(|comment| select_fields(comment, fields))
            .collect()
    };
    Ok(serde_json::to_string_pretty(&selected)?)
}

/// Keep only the requested keys that the comment actually has.
fn select_fields(comment: &Value, fields: &[String]) -> Value {
    let mut out = Map::new();
    if let Some(obj) = comment.as_object() {
        for field in fields {
            if let Some(value) = obj.get(field) {
                out.insert(field.clone(), value.clone());
            }
        }
    }
    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_fields_are_skipped() {
        let comment = json!({ "id": 1, "name": "n", "email": "e@x.io", "body": "b" });
        let picked = select_fields(&comment, &["email".into(), "missing".into()]);
        assert_eq!(picked, json!({ "email": "e@x.io" }));
    }
}

use std::sync::Arc;

use serde::Deserialize;

use super::{parse_base, truncate_chars, SNIPPET_MAX_CHARS};
use crate::error::ThreadlineError;
use crate::provider::http::shared_client;
use crate::tools::tool::{AgentTool, Tool, ToolExecutionContext};
use crate::tools::types::ToolParameters;

const TOOL: &str = "wikipedia";

#[derive(Deserialize)]
struct PageSummary {
    #[serde(default)]
    extract: String,
}

/// Create the `wikipedia` tool. Looks up a page summary through the REST API
/// rooted at `base_url` (e.g. `https://en.wikipedia.org/api/rest_v1`).
pub fn wikipedia_tool(base_url: &str) -> Arc<dyn Tool> {
    let base_url = base_url.to_string();
    Arc::new(AgentTool::new(
        TOOL,
        "Search for a term on Wikipedia and get a summary.",
        ToolParameters::object()
            .string("query", "The search term to look up on Wikipedia.", true)
            .build(),
        move |args, _ctx: ToolExecutionContext| {
            let base_url = base_url.clone();
            async move {
                let query = args.get_str("query")?.trim().to_string();
                if query.is_empty() {
                    return Err(ThreadlineError::tool(TOOL, "query must not be empty"));
                }
                fetch_summary(&base_url, &query).await
            }
        },
    ))
}

async fn fetch_summary(base_url: &str, query: &str) -> Result<String, ThreadlineError> {
    let mut url = parse_base(TOOL, base_url)?;
    let title = query.replace(' ', "_");
    url.path_segments_mut()
        .map_err(|_| ThreadlineError::tool(TOOL, format!("invalid endpoint '{base_url}'")))?
        .pop_if_empty()
        .extend(["page", "summary", title.as_str()]);

    let response = shared_client()
        .get(url)
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await
        .map_err(|e| ThreadlineError::tool(TOOL, format!("request to Wikipedia failed: {e}")))?;
    if response.status() == reqwest::StatusCode::NOT_FOUND {
        return Err(ThreadlineError::tool(
            TOOL,
            format!("the page for \"{query}\" may not exist"),
        ));
    }
    let response = send_checked_status(response)?;

    let summary: PageSummary = response
        .json()
        .await
        .map_err(|e| ThreadlineError::tool(TOOL, format!("unreadable response from Wikipedia: {e}")))?;
    if summary.extract.trim().is_empty() {
        return Ok(format!("Could not find a summary for \"{query}\"."));
    }

    let (snippet, truncated) = truncate_chars(&summary.extract, SNIPPET_MAX_CHARS);
    let mut out = format!("Summary for \"{query}\" from Wikipedia:\n{snippet}");
    if truncated {
        out.push_str("... (truncated)");
    }
    Ok(out)
}

fn send_checked_status(response: reqwest::Response) -> Result<reqwest::Response, ThreadlineError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ThreadlineError::tool(
            TOOL,
            format!("received status {} from Wikipedia", status.as_u16()),
        ))
    }
}

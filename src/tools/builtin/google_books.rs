use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{parse_base, read_json, send_checked, truncate_chars};
use crate::error::ThreadlineError;
use crate::provider::http::shared_client;
use crate::tools::tool::{AgentTool, Tool, ToolExecutionContext};
use crate::tools::types::ToolParameters;

const TOOL: &str = "google_books";
const SERVICE: &str = "Google Books API";
const DEFAULT_MAX_RESULTS: i64 = 3;
const DESCRIPTION_PREVIEW_CHARS: usize = 100;

#[derive(Deserialize)]
struct VolumeList {
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Volume {
    volume_info: VolumeInfo,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    #[serde(default)]
    title: String,
    authors: Option<Vec<String>>,
    published_date: Option<String>,
    description: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BookSummary {
    title: String,
    authors: Vec<String>,
    published_date: String,
    description: String,
}

impl From<VolumeInfo> for BookSummary {
    fn from(info: VolumeInfo) -> Self {
        let description = match info.description {
            Some(text) => {
                let (preview, _) = truncate_chars(&text, DESCRIPTION_PREVIEW_CHARS);
                format!("{preview}...")
            }
            None => "No description available.".to_string(),
        };
        Self {
            title: info.title,
            authors: info.authors.unwrap_or_else(|| vec!["N/A".to_string()]),
            published_date: info.published_date.unwrap_or_else(|| "N/A".to_string()),
            description,
        }
    }
}

/// Create the `google_books` tool. Searches volumes under `base_url`
/// (e.g. `https://www.googleapis.com/books/v1`).
pub fn google_books_tool(base_url: &str) -> Arc<dyn Tool> {
    let base_url = base_url.to_string();
    Arc::new(AgentTool::new(
        TOOL,
        "Search for books using the Google Books API.",
        ToolParameters::object()
            .string("q", "The search query for books.", true)
            .integer(
                "maxResults",
                "The maximum number of results to return (default 3).",
                false,
            )
            .build(),
        move |args, _ctx: ToolExecutionContext| {
            let base_url = base_url.clone();
            async move {
                let query = args.get_str("q")?.to_string();
                let max_results = args
                    .get_i64_opt("maxResults")
                    .unwrap_or(DEFAULT_MAX_RESULTS)
                    .clamp(1, 40);
                search(&base_url, &query, max_results).await
            }
        },
    ))
}

async fn search(base_url: &str, query: &str, max_results: i64) -> Result<String, ThreadlineError> {
    let mut url = parse_base(TOOL, base_url)?;
    url.path_segments_mut()
        .map_err(|_| ThreadlineError::tool(TOOL, format!("invalid endpoint '{base_url}'")))?
        .pop_if_empty()
        .push("volumes");

    let request = shared_client()
        .get(url)
        .query(&[("q", query.to_string()), ("maxResults", max_results.to_string())]);
    let response = send_checked(TOOL, SERVICE, request).await?;
    let body = read_json(TOOL, SERVICE, response).await?;
    let list: VolumeList = serde_json::from_value(body)
        .map_err(|e| ThreadlineError::tool(TOOL, format!("unexpected response shape: {e}")))?;

    if list.items.is_empty() {
        return Ok(format!("No books found for query: \"{query}\""));
    }
    let books: Vec<BookSummary> = list
        .items
        .into_iter()
        .map(|item| BookSummary::from(item.volume_info))
        .collect();
    Ok(serde_json::to_string_pretty(&books)?)
}

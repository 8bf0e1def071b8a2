//! Built-in tools shipped with the engine.
//!
//! Each tool is constructed via [`AgentTool::new`] and returned as
//! `Arc<dyn Tool>`. HTTP tools read their upstream base URLs from
//! [`ToolEndpoints`] so they can be pointed at local fakes.
//!
//! ```rust,no_run
//! use threadline::config::ToolEndpoints;
//! use threadline::tools::builtin::all_tools;
//!
//! let tools = all_tools(&ToolEndpoints::default());
//! assert_eq!(tools.len(), 6);
//! ```

pub mod comments;
pub mod google_books;
pub mod help;
pub mod jsonata;
pub mod wikipedia;
pub mod youtube;

use std::sync::Arc;

use crate::config::ToolEndpoints;
use crate::error::ThreadlineError;
use crate::tools::tool::Tool;

pub use comments::curl_comments_tool;
pub use google_books::google_books_tool;
pub use help::help_tool;
pub use jsonata::jsonata_tool;
pub use wikipedia::wikipedia_tool;
pub use youtube::youtube_transcript_tool;

/// Longest text snippet a fetching tool hands back to the model.
pub(crate) const SNIPPET_MAX_CHARS: usize = 4500;

/// Every built-in tool, `help` first.
pub fn all_tools(endpoints: &ToolEndpoints) -> Vec<Arc<dyn Tool>> {
    let others = vec![
        youtube_transcript_tool(&endpoints.youtube),
        google_books_tool(&endpoints.google_books),
        wikipedia_tool(&endpoints.wikipedia),
        curl_comments_tool(&endpoints.comments),
        jsonata_tool(),
    ];
    let names: Vec<String> = others.iter().map(|t| t.name().to_string()).collect();

    let mut tools = Vec::with_capacity(others.len() + 1);
    tools.push(help_tool(names));
    tools.extend(others);
    tools
}

/// Keep at most `max_chars` characters. Returns the text and whether it was cut.
pub(crate) fn truncate_chars(s: &str, max_chars: usize) -> (String, bool) {
    match s.char_indices().nth(max_chars) {
        Some((cutoff, _)) => (s[..cutoff].to_string(), true),
        None => (s.to_string(), false),
    }
}

/// Parse a configured base URL.
pub(crate) fn parse_base(tool: &str, base: &str) -> Result<reqwest::Url, ThreadlineError> {
    reqwest::Url::parse(base)
        .map_err(|e| ThreadlineError::tool(tool, format!("invalid endpoint '{base}': {e}")))
}

/// Send a GET and reject non-success statuses.
pub(crate) async fn send_checked(
    tool: &str,
    service: &str,
    request: reqwest::RequestBuilder,
) -> Result<reqwest::Response, ThreadlineError> {
    let response = request
        .send()
        .await
        .map_err(|e| ThreadlineError::tool(tool, format!("request to {service} failed: {e}")))?;
    let status = response.status();
    if !status.is_success() {
        return Err(ThreadlineError::tool(
            tool,
            format!("received status {} from {service}", status.as_u16()),
        ));
    }
    Ok(response)
}

/// Read a JSON body, reporting decode failures as tool errors.
pub(crate) async fn read_json(
    tool: &str,
    service: &str,
    response: reqwest::Response,
) -> Result<serde_json::Value, ThreadlineError> {
    response
        .json()
        .await
        .map_err(|e| ThreadlineError::tool(tool, format!("unreadable response from {service}: {e}")))
}

//! Handlers behind each subcommand.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use futures::StreamExt;

use super::{ChatArgs, ServeArgs};
use crate::agent_loop::{AgentEngine, TurnRequest};
use crate::config::EngineConfig;
use crate::error::{Result, ThreadlineError};
use crate::server::{self, AppState, TokenAuthenticator};
use crate::stream::StreamEvent;
use crate::tools::builtin;

const PREVIEW_CHARS: usize = 200;

pub async fn handle_serve(config_path: Option<&Path>, args: ServeArgs) -> Result<()> {
    let mut config = EngineConfig::load(config_path)?;
    if let Some(bind) = args.bind {
        config.bind = bind;
    }
    let engine = Arc::new(AgentEngine::from_config(&config)?);
    let auth = TokenAuthenticator::new(config.api_tokens.clone());
    if !auth.is_enabled() {
        tracing::warn!("no api tokens configured; the chat route is unauthenticated");
    }
    server::serve(AppState::new(engine, auth), &config.bind).await
}

pub async fn handle_chat(config_path: Option<&Path>, args: ChatArgs) -> Result<()> {
    let config = EngineConfig::load(config_path)?;
    let engine = Arc::new(AgentEngine::from_config(&config)?);
    let thread_id = args
        .thread
        .unwrap_or_else(|| format!("cli-{}", uuid::Uuid::new_v4()));

    let mut events = engine
        .start(TurnRequest::new(thread_id, args.message))?
        .into_events();
    let mut failure = None;
    while let Some(event) = events.next().await {
        match event? {
            StreamEvent::Connected | StreamEvent::Done => {}
            StreamEvent::Token { token } => {
                print!("{token}");
                let _ = std::io::stdout().flush();
            }
            StreamEvent::ToolStart { tool, input } => {
                eprintln!("\n⚡ {tool} {input}");
            }
            StreamEvent::ToolEnd {
                output, is_error, ..
            } => {
                let preview = preview(&output);
                if is_error {
                    eprintln!("  ❌ {preview}");
                } else {
                    eprintln!("  ✅ {preview}");
                }
            }
            StreamEvent::Error { error } => failure = Some(error),
        }
    }
    println!();

    match failure {
        Some(error) => Err(ThreadlineError::Stream(error)),
        None => Ok(()),
    }
}

pub fn handle_tools(config_path: Option<&Path>) -> Result<()> {
    let config = EngineConfig::load(config_path)?;
    for tool in builtin::all_tools(&config.tools) {
        println!("{:<20} {}", tool.name(), tool.description());
    }
    Ok(())
}

fn preview(output: &str) -> String {
    match output.char_indices().nth(PREVIEW_CHARS) {
        Some((end, _)) => format!("{}...", &output[..end]),
        None => output.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_cuts_on_char_boundary() {
        let long = "é".repeat(PREVIEW_CHARS + 10);
        let cut = preview(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), PREVIEW_CHARS + 3);
        assert_eq!(preview("short"), "short");
    }
}

//! Threadline: a streaming tool-calling agent engine.
//!
//! One [`AgentEngine`](agent_loop::AgentEngine) runs conversational turns
//! for many threads. Each turn alternates model reasoning with tool
//! execution, streams its progress as SSE frames, and checkpoints the
//! thread's history when it completes.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use futures::StreamExt;
//! use threadline::prelude::*;
//!
//! # async fn example() -> threadline::error::Result<()> {
//! let config = EngineConfig::from_env()?;
//! let engine = Arc::new(AgentEngine::from_config(&config)?);
//! let mut events = engine
//!     .start(TurnRequest::new("thread-1", "Tell me about the Moon"))?
//!     .into_events();
//! while let Some(event) = events.next().await {
//!     if let StreamEvent::Token { token } = event? {
//!         print!("{token}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod agent_loop;
pub mod checkpoint;
pub mod config;
pub mod error;
pub mod prelude;
pub mod provider;
pub mod stream;
pub mod tools;
pub mod transcript;
pub mod types;
pub mod util;

#[cfg(feature = "server")]
pub mod server;

#[cfg(feature = "cli")]
pub mod cli;

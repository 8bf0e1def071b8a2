//! Command-line interface for threadline.

pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Threadline agent server
#[derive(Parser, Debug)]
#[command(name = "threadline", version, about = "Streaming tool-calling agent engine")]
pub struct Cli {
    /// TOML configuration file; environment variables override it
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server
    Serve(ServeArgs),
    /// Run one turn in-process and print the stream
    Chat(ChatArgs),
    /// List the registered tools
    Tools,
}

/// Arguments for `threadline serve`.
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Listen address, overriding the configured one
    #[arg(short, long)]
    pub bind: Option<String>,
}

/// Arguments for `threadline chat`.
#[derive(Parser, Debug)]
pub struct ChatArgs {
    /// Thread to continue; a fresh one is used when omitted
    #[arg(short, long)]
    pub thread: Option<String>,

    /// The user message
    pub message: String,
}

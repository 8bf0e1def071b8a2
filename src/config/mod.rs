//! Engine configuration (layered: defaults < TOML file < environment).

mod prompt;

pub use prompt::SYSTEM_PROMPT;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{Result, ThreadlineError};
use crate::provider::groq::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::types::GenerationSettings;

/// What to do when one reasoning step requests several tool calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ToolCallPolicy {
    /// Execute every requested call, in request order.
    #[default]
    All,
    /// Execute only the first call and drop the rest.
    FirstOnly,
}

/// Upstream base URLs for the built-in HTTP tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolEndpoints {
    pub wikipedia: String,
    pub google_books: String,
    pub comments: String,
    pub youtube: String,
}

impl Default for ToolEndpoints {
    fn default() -> Self {
        Self {
            wikipedia: "https://en.wikipedia.org/api/rest_v1".to_string(),
            google_books: "https://www.googleapis.com/books/v1".to_string(),
            comments: "https://jsonplaceholder.typicode.com".to_string(),
            youtube: "https://www.youtube.com".to_string(),
        }
    }
}

/// Everything needed to build an engine and serve it.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub groq_api_key: Option<String>,
    pub groq_base_url: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Upper bound on Acting phases per turn.
    pub max_cycles: usize,
    /// Cost budget handed to the history trimmer.
    pub history_budget: usize,
    pub tool_call_policy: ToolCallPolicy,
    pub tool_timeout_secs: u64,
    pub stream_idle_timeout_ms: u64,
    /// Attempts at opening a model stream before giving up.
    pub connect_attempts: u32,
    /// Buffered events per turn before the producer waits on the client.
    pub channel_capacity: usize,
    pub bind: String,
    /// File checkpoints live here; `None` keeps them in memory.
    pub checkpoint_dir: Option<PathBuf>,
    /// Accepted bearer tokens. Empty disables authentication.
    pub api_tokens: Vec<String>,
    pub system_prompt: String,
    pub tools: ToolEndpoints,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            groq_api_key: None,
            groq_base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            max_tokens: 4096,
            max_cycles: 25,
            history_budget: 4000,
            tool_call_policy: ToolCallPolicy::All,
            tool_timeout_secs: 30,
            stream_idle_timeout_ms: 120_000,
            connect_attempts: 3,
            channel_capacity: 64,
            bind: "127.0.0.1:3000".to_string(),
            checkpoint_dir: None,
            api_tokens: Vec::new(),
            system_prompt: SYSTEM_PROMPT.to_string(),
            tools: ToolEndpoints::default(),
        }
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("groq_api_key", &self.groq_api_key.as_ref().map(|_| ".."))
            .field("groq_base_url", &self.groq_base_url)
            .field("model", &self.model)
            .field("max_cycles", &self.max_cycles)
            .field("history_budget", &self.history_budget)
            .field("tool_call_policy", &self.tool_call_policy)
            .field("bind", &self.bind)
            .field("checkpoint_dir", &self.checkpoint_dir)
            .field("api_tokens", &self.api_tokens.len())
            .finish_non_exhaustive()
    }
}

impl EngineConfig {
    /// Load defaults, then `path` (if any), then the process environment.
    /// A `.env` file in the working directory is read first.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let _ = dotenvy::dotenv();
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    /// Parse a TOML file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ThreadlineError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| ThreadlineError::Configuration(e.to_string()))
    }

    /// Overlay variables resolved through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("GROQ_API_KEY") {
            self.groq_api_key = Some(key);
        }
        if let Some(url) = get("GROQ_BASE_URL") {
            self.groq_base_url = url;
        }
        if let Some(model) = get("THREADLINE_MODEL") {
            self.model = model;
        }
        if let Some(raw) = get("THREADLINE_MAX_CYCLES") {
            self.max_cycles = parse_var("THREADLINE_MAX_CYCLES", &raw)?;
        }
        if let Some(raw) = get("THREADLINE_HISTORY_BUDGET") {
            self.history_budget = parse_var("THREADLINE_HISTORY_BUDGET", &raw)?;
        }
        if let Some(raw) = get("THREADLINE_TOOL_CALL_POLICY") {
            self.tool_call_policy = parse_var("THREADLINE_TOOL_CALL_POLICY", &raw)?;
        }
        if let Some(bind) = get("THREADLINE_BIND") {
            self.bind = bind;
        }
        if let Some(dir) = get("THREADLINE_CHECKPOINT_DIR") {
            self.checkpoint_dir = Some(PathBuf::from(dir));
        }
        if let Some(raw) = get("THREADLINE_API_TOKENS") {
            self.api_tokens = raw
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect();
        }
        Ok(())
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_cycles == 0 {
            return Err(ThreadlineError::Configuration(
                "max_cycles must be at least 1".into(),
            ));
        }
        if self.history_budget == 0 {
            return Err(ThreadlineError::Configuration(
                "history_budget must be positive".into(),
            ));
        }
        if self.channel_capacity == 0 {
            return Err(ThreadlineError::Configuration(
                "channel_capacity must be positive".into(),
            ));
        }
        if self.connect_attempts == 0 {
            return Err(ThreadlineError::Configuration(
                "connect_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Model sampling settings for every reasoning step.
    pub fn generation_settings(&self) -> GenerationSettings {
        GenerationSettings::builder()
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .stream_idle_timeout_ms(self.stream_idle_timeout_ms)
            .build()
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }
}

fn parse_var<T: FromStr>(key: &str, raw: &str) -> Result<T>
where
    T::Err: fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| ThreadlineError::Configuration(format!("{key}={raw:?}: {e}")))
}

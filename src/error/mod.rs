//! Error types for threadline.

pub mod unified;

pub use unified::{ErrorCategory, TerminationReason};

use thiserror::Error;

/// Primary error type for all engine operations.
#[derive(Error, Debug)]
pub enum ThreadlineError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limited: retry after {retry_after_ms:?}ms")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Tool execution error: {tool_name}: {message}")]
    ToolExecution { tool_name: String, message: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    #[error("Thread '{0}' already has a turn in flight")]
    ThreadBusy(String),

    #[error("cycle limit exceeded")]
    CycleLimitExceeded { max_cycles: usize },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Turn canceled")]
    Canceled,
}

impl ThreadlineError {
    /// Create an API error from a status and body.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a tool execution error.
    pub fn tool(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolExecution {
            tool_name: tool_name.into(),
            message: message.into(),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Authentication(_) => ErrorCategory::Authentication,
            Self::RateLimited { .. } => ErrorCategory::RateLimit,
            Self::Network(_) | Self::Stream(_) => ErrorCategory::Network,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::Api { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                429 => ErrorCategory::RateLimit,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Api,
            },
            Self::ToolExecution { .. } => ErrorCategory::ToolExecution,
            Self::Checkpoint(_) => ErrorCategory::Persistence,
            Self::ThreadBusy(_) => ErrorCategory::Concurrency,
            Self::CycleLimitExceeded { .. } => ErrorCategory::Limit,
            Self::Transport(_) => ErrorCategory::Transport,
            _ => ErrorCategory::Unknown,
        }
    }

    /// Whether this error is potentially retryable.
    ///
    /// Only consulted before a model stream has produced anything.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::RateLimit
                | ErrorCategory::Network
                | ErrorCategory::Timeout
                | ErrorCategory::Server
        )
    }

    /// The terminal state a turn ends in when this error aborts it.
    pub fn termination_reason(&self) -> TerminationReason {
        match self {
            Self::CycleLimitExceeded { .. } => TerminationReason::LimitExceeded,
            Self::Canceled => TerminationReason::Canceled,
            _ => TerminationReason::FatalError,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ThreadlineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_status_maps_to_category() {
        assert_eq!(
            ThreadlineError::api(401, "nope").category(),
            ErrorCategory::Authentication
        );
        assert_eq!(
            ThreadlineError::api(429, "slow down").category(),
            ErrorCategory::RateLimit
        );
        assert_eq!(
            ThreadlineError::api(503, "down").category(),
            ErrorCategory::Server
        );
        assert_eq!(ThreadlineError::api(400, "bad").category(), ErrorCategory::Api);
    }

    #[test]
    fn only_transient_errors_are_retryable() {
        assert!(ThreadlineError::api(502, "bad gateway").is_retryable());
        assert!(ThreadlineError::RateLimited { retry_after_ms: None }.is_retryable());
        assert!(ThreadlineError::Timeout(10).is_retryable());
        assert!(!ThreadlineError::api(400, "bad").is_retryable());
        assert!(!ThreadlineError::CycleLimitExceeded { max_cycles: 3 }.is_retryable());
        assert!(!ThreadlineError::Transport("closed".into()).is_retryable());
    }

    #[test]
    fn cycle_limit_message_is_stable() {
        let err = ThreadlineError::CycleLimitExceeded { max_cycles: 4 };
        assert_eq!(err.to_string(), "cycle limit exceeded");
        assert_eq!(err.termination_reason(), TerminationReason::LimitExceeded);
    }
}

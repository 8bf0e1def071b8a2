//! Per-turn agent state and outcomes.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::error::TerminationReason;
use crate::types::Message;

/// Phase of the reasoning/acting loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Reasoning,
    Acting,
    Terminated(TerminationReason),
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reasoning => f.write_str("reasoning"),
            Self::Acting => f.write_str("acting"),
            Self::Terminated(reason) => write!(f, "terminated({reason})"),
        }
    }
}

/// State owned exclusively by one in-flight turn.
#[derive(Debug, Clone)]
pub struct AgentState {
    pub thread_id: String,
    pub history: Vec<Message>,
    /// Completed Acting phases.
    pub cycle_count: usize,
    pub phase: Phase,
}

impl AgentState {
    pub fn new(thread_id: impl Into<String>, history: Vec<Message>) -> Self {
        Self {
            thread_id: thread_id.into(),
            history,
            cycle_count: 0,
            phase: Phase::Reasoning,
        }
    }

    pub fn enter(&mut self, phase: Phase) {
        tracing::debug!(
            thread_id = %self.thread_id,
            cycle = self.cycle_count,
            from = %self.phase,
            to = %phase,
            "phase transition"
        );
        self.phase = phase;
    }
}

/// Final status of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TurnStatus {
    Completed,
    LimitExceeded,
    Failed,
    Canceled,
}

impl From<TerminationReason> for TurnStatus {
    fn from(reason: TerminationReason) -> Self {
        match reason {
            TerminationReason::Success => Self::Completed,
            TerminationReason::LimitExceeded => Self::LimitExceeded,
            TerminationReason::FatalError => Self::Failed,
            TerminationReason::Canceled => Self::Canceled,
        }
    }
}

/// What a turn ended with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub status: TurnStatus,
    /// Concatenation of every token streamed in the turn (completed turns only).
    pub reply: Option<String>,
    pub cycles: usize,
    pub error: Option<String>,
}

impl TurnOutcome {
    pub fn completed(reply: String, cycles: usize) -> Self {
        Self {
            status: TurnStatus::Completed,
            reply: Some(reply),
            cycles,
            error: None,
        }
    }

    pub fn terminated(reason: TerminationReason, cycles: usize, error: impl Into<String>) -> Self {
        Self {
            status: reason.into(),
            reply: None,
            cycles,
            error: Some(error.into()),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == TurnStatus::Completed
    }
}

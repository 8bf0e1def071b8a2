//! Agent execution engine: the reasoning/acting loop and its support.

pub mod engine;
pub mod locks;
pub mod state;
pub mod trimmer;

pub use engine::{AgentEngine, EngineOptions, TurnRequest};
pub use locks::{ThreadGuard, ThreadLocks};
pub use state::{AgentState, Phase, TurnOutcome, TurnStatus};
pub use trimmer::{estimate_message_cost, trim_history, HistoryTrimmer};

//! Tool system: named capabilities the model may call.

pub mod arguments;
pub mod builtin;
pub mod invoker;
pub mod tool;
pub mod types;
pub mod validation;

pub use arguments::ToolArguments;
pub use invoker::{ToolInvoker, ToolRegistry};
pub use tool::{AgentTool, Tool, ToolExecutionContext};
pub use types::{ParameterBuilder, ToolParameters};
pub use validation::validate_arguments;

use std::sync::Arc;

use crate::tools::tool::{AgentTool, Tool, ToolExecutionContext};
use crate::tools::types::ToolParameters;

/// Create the `help` tool. It takes no arguments and names the other tools.
pub fn help_tool(tool_names: Vec<String>) -> Arc<dyn Tool> {
    let listing = format!(
        "You can use the following tools: {}.",
        tool_names.join(", ")
    );
    Arc::new(AgentTool::new(
        "help",
        "Provides help information and lists all available tools.",
        ToolParameters::empty(),
        move |_args, _ctx: ToolExecutionContext| {
            let listing = listing.clone();
            async move { Ok(listing) }
        },
    ))
}

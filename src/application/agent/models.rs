use serde::Serialize;
use serde_json::Value;

use crate::application::tooling::ToolExecution;
use crate::domain::message::Message;

#[derive(Debug, Clone, Default)]
pub struct AgentOptions {
    /// Overrides the agent's default model for this run.
    pub model: Option<String>,
    /// Overrides the agent's default system prompt for this run.
    pub system_prompt: Option<String>,
    /// Maximum model turns before the loop stops with `TurnLimit`. `None`
    /// leaves the loop unbounded; callers wanting robustness should set it.
    pub max_turns: Option<usize>,
}

/// One executed tool call, kept in the run trace.
#[derive(Debug, Clone, Serialize)]
pub struct AgentStep {
    pub tool: String,
    pub input: Value,
    pub success: bool,
    pub output: String,
}

impl From<&ToolExecution> for AgentStep {
    fn from(execution: &ToolExecution) -> Self {
        Self {
            tool: execution.tool.clone(),
            input: execution.input.clone(),
            success: execution.success,
            output: execution.output.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AgentOutcome {
    pub response: String,
    pub steps: Vec<AgentStep>,
    pub messages: Vec<Message>,
}

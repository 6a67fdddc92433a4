use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::message::{Message, ToolCallRequest};
use crate::domain::tool::ToolDeclaration;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("tool '{0}' is already registered")]
    DuplicateTool(String),
    #[error("unknown tool '{0}'")]
    UnknownTool(String),
    #[error("invalid arguments for tool '{tool}': {}", .violations.join("; "))]
    InvalidArguments {
        tool: String,
        violations: Vec<String>,
    },
    #[error("tool '{tool}' execution failed: {reason}")]
    Execution { tool: String, reason: String },
}

impl ToolError {
    pub fn invalid_arguments(tool: impl Into<String>, violations: Vec<String>) -> Self {
        Self::InvalidArguments {
            tool: tool.into(),
            violations,
        }
    }

    pub fn execution(tool: impl Into<String>, reason: impl ToString) -> Self {
        Self::Execution {
            tool: tool.into(),
            reason: reason.to_string(),
        }
    }
}

/// A tool implementation. Handlers validate their own arguments and return
/// the textual content for the answering tool message.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, arguments: Map<String, Value>) -> Result<String, ToolError>;
}

/// Immutable after registration.
#[derive(Clone)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
    pub handler: Arc<dyn ToolHandler>,
}

/// Record of one dispatched tool call, kept for the agent trace.
#[derive(Debug, Clone)]
pub struct ToolExecution {
    pub tool: String,
    pub call_id: String,
    pub success: bool,
    pub input: Value,
    pub output: String,
}

impl ToolExecution {
    pub fn to_message(&self) -> Message {
        Message::tool(self.output.clone(), self.call_id.clone())
    }
}

/// Read-only after construction; shared across concurrent conversations.
#[derive(Default)]
pub struct ToolRegistry {
    specs: Vec<ToolSpec>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, spec: ToolSpec) -> Result<(), ToolError> {
        if self.index.contains_key(&spec.name) {
            return Err(ToolError::DuplicateTool(spec.name));
        }
        debug!(tool = spec.name.as_str(), "Registered tool");
        self.index.insert(spec.name.clone(), self.specs.len());
        self.specs.push(spec);
        Ok(())
    }

    pub fn declarations(&self) -> Vec<ToolDeclaration> {
        self.specs
            .iter()
            .map(|spec| ToolDeclaration {
                name: spec.name.clone(),
                description: spec.description.clone(),
                parameters: spec.parameters.clone(),
            })
            .collect()
    }

    /// Looks up the named tool, validates the arguments, and runs the
    /// handler. Errors are returned to the caller; `dispatch` decides how
    /// they surface.
    pub async fn execute(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<String, ToolError> {
        let Some(position) = self.index.get(name) else {
            warn!(requested_tool = name, "Unknown tool requested by agent");
            return Err(ToolError::UnknownTool(name.to_string()));
        };
        let spec = &self.specs[*position];
        spec.handler.call(arguments).await
    }

    /// Executes one pending call and wraps the outcome as a tool-result
    /// message tagged with the originating call id. Every tool-layer failure
    /// becomes data the model can observe and recover from, never a loop
    /// abort.
    pub async fn dispatch(&self, call: &ToolCallRequest) -> ToolExecution {
        let input = Value::Object(call.arguments.clone());
        match self.execute(&call.name, call.arguments.clone()).await {
            Ok(output) => {
                let execution = ToolExecution {
                    tool: call.name.clone(),
                    call_id: call.call_id.clone(),
                    success: true,
                    input,
                    output,
                };
                info!(tool = %execution.tool, success = execution.success, "Tool executed");
                execution
            }
            Err(err) => {
                warn!(tool = %call.name, %err, "Tool execution failed");
                ToolExecution {
                    tool: call.name.clone(),
                    call_id: call.call_id.clone(),
                    success: false,
                    input,
                    output: format!("Tool error: {err}"),
                }
            }
        }
    }
}

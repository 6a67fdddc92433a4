//! Message adapters - convert between domain types and the Ollama wire format

use crate::domain::message::{Message, Role};
use crate::domain::tool::ToolDeclaration;
use serde_json::{Value, json};

pub struct MessageAdapter;

impl MessageAdapter {
    /// Convert messages to Ollama chat format.
    /// Returns: [{"role": "...", "content": "...", ...}]
    pub fn to_ollama_format(messages: &[Message]) -> Vec<Value> {
        messages
            .iter()
            .map(|message| {
                let role = match message.role {
                    Role::System => "system",
                    Role::Human => "user",
                    Role::Assistant => "assistant",
                    Role::Tool => "tool",
                };
                let mut wire = json!({
                    "role": role,
                    "content": message.content.clone(),
                });
                if let Value::Object(map) = &mut wire {
                    if message.has_tool_calls() {
                        let calls: Vec<Value> = message
                            .tool_calls
                            .iter()
                            .map(|call| {
                                json!({
                                    "function": {
                                        "name": call.name.clone(),
                                        "arguments": call.arguments.clone(),
                                    }
                                })
                            })
                            .collect();
                        map.insert("tool_calls".to_string(), Value::Array(calls));
                    }
                    if let Some(call_id) = &message.tool_call_id {
                        map.insert("tool_call_id".to_string(), json!(call_id));
                    }
                }
                wire
            })
            .collect()
    }

    /// Convert tool declarations to Ollama function-calling format.
    pub fn to_ollama_tools(tools: &[ToolDeclaration]) -> Vec<Value> {
        tools
            .iter()
            .map(|tool| {
                json!({
                    "type": "function",
                    "function": {
                        "name": tool.name.clone(),
                        "description": tool.description.clone(),
                        "parameters": tool.parameters.clone(),
                    }
                })
            })
            .collect()
    }
}

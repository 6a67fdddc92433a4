use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Reported instead of failing when the history ends without any
/// text-bearing assistant message.
pub const NO_FINAL_ANSWER: &str = "no final answer produced";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    Human,
    Assistant,
    Tool,
}

/// A single tool invocation requested by the assistant. `call_id` is echoed
/// back in the answering tool message for correlation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub name: String,
    pub arguments: Map<String, Value>,
    pub call_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn human(content: impl Into<String>) -> Self {
        Self::new(Role::Human, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn tool(content: impl Into<String>, call_id: impl Into<String>) -> Self {
        let mut message = Self::new(Role::Tool, content);
        message.tool_call_id = Some(call_id.into());
        message
    }

    pub fn with_tool_calls(mut self, calls: Vec<ToolCallRequest>) -> Self {
        self.tool_calls = calls;
        self
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Ordered conversation history. Append-only from the outside; internally a
/// merge replaces in place when the incoming message carries the id of an
/// existing one, so a plain-text turn can be upgraded to a tool-call-bearing
/// turn without duplicating it.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn merge(&mut self, incoming: Message) {
        if let Some(existing) = self
            .messages
            .iter_mut()
            .find(|message| message.id == incoming.id)
        {
            *existing = incoming;
        } else {
            self.messages.push(incoming);
        }
    }

    /// Inserts a system message at index 0 unless one is already present.
    /// The only entry point for system messages, which keeps the invariant:
    /// at most one, always first.
    pub fn ensure_system(&mut self, prompt: &str) {
        let seeded = matches!(self.messages.first(), Some(first) if first.role == Role::System);
        if !seeded {
            self.messages.insert(0, Message::system(prompt));
        }
    }

    /// Scans backward for the most recent assistant message with non-empty
    /// text. A history ending on an empty-content tool-call message is
    /// expected, not an error.
    pub fn last_assistant_text(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|message| {
                message.role == Role::Assistant && !message.content.trim().is_empty()
            })
            .map(|message| message.content.as_str())
            .unwrap_or(NO_FINAL_ANSWER)
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_appends_new_messages() {
        let mut conversation = Conversation::new();
        conversation.merge(Message::human("hi"));
        conversation.merge(Message::assistant("hello"));
        assert_eq!(conversation.len(), 2);
    }

    #[test]
    fn merge_replaces_by_id_without_growing() {
        let mut conversation = Conversation::new();
        let original = Message::assistant("plain text");
        let id = original.id.clone();
        conversation.merge(original);

        let mut upgraded = Message::assistant("plain text");
        upgraded.id = id.clone();
        upgraded.tool_calls = vec![ToolCallRequest {
            name: "search_eda_kb".into(),
            arguments: Map::new(),
            call_id: "call-1".into(),
        }];
        conversation.merge(upgraded);

        assert_eq!(conversation.len(), 1);
        assert!(conversation.messages()[0].has_tool_calls());
        assert_eq!(conversation.messages()[0].id, id);
    }

    #[test]
    fn ensure_system_seeds_once_at_front() {
        let mut conversation = Conversation::new();
        conversation.merge(Message::human("question"));
        conversation.ensure_system("be helpful");
        conversation.ensure_system("be helpful");

        let system_count = conversation
            .messages()
            .iter()
            .filter(|message| message.role == Role::System)
            .count();
        assert_eq!(system_count, 1);
        assert_eq!(conversation.messages()[0].role, Role::System);
    }

    #[test]
    fn last_assistant_text_skips_empty_tool_call_tail() {
        let mut conversation = Conversation::new();
        conversation.merge(Message::human("make a plan"));
        conversation.merge(Message::assistant("Here is the plan."));
        conversation.merge(Message::assistant("").with_tool_calls(vec![ToolCallRequest {
            name: "create_eda_plan".into(),
            arguments: Map::new(),
            call_id: "call-2".into(),
        }]));

        assert_eq!(conversation.last_assistant_text(), "Here is the plan.");
    }

    #[test]
    fn last_assistant_text_reports_sentinel_when_absent() {
        let mut conversation = Conversation::new();
        conversation.merge(Message::human("anyone there?"));
        assert_eq!(conversation.last_assistant_text(), NO_FINAL_ANSWER);
    }
}

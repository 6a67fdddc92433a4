use serde_json::Value;

use crate::domain::message::{Message, ToolCallRequest};

/// Placeholder call id for tool requests recovered from free text. The
/// fallback path synthesizes exactly one call per turn, so the fixed id
/// cannot collide within a turn.
pub const FALLBACK_CALL_ID: &str = "fallback-call-0";

/// Routing decision for one assistant message.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    /// The message already carries native tool-call requests.
    ExecuteNative,
    /// The message text parsed as a tool request; the carried message is the
    /// upgraded copy (same id, so a merge replaces the original in place).
    ExecuteAfterNormalize(Message),
    /// Plain prose, or JSON of the wrong shape. The common case.
    FinalAnswer,
}

/// Detection runs in fixed priority order: native tool calls win over
/// anything the text looks like.
pub fn route_message(message: &Message) -> Route {
    if message.has_tool_calls() {
        return Route::ExecuteNative;
    }

    match parse_tool_request(&message.content) {
        Some(call) => {
            let upgraded = message.clone().with_tool_calls(vec![call]);
            Route::ExecuteAfterNormalize(upgraded)
        }
        None => Route::FinalAnswer,
    }
}

/// Permissive shape probe over the raw message text: `Some` only when the
/// whole text parses as a JSON object with a string `name` and an object
/// `arguments`. Everything else (prose, fenced or partial JSON, arrays,
/// missing keys) is a final answer, never an error.
fn parse_tool_request(content: &str) -> Option<ToolCallRequest> {
    let value: Value = serde_json::from_str(content.trim()).ok()?;
    let map = value.as_object()?;
    let name = map.get("name")?.as_str()?;
    let arguments = map.get("arguments")?.as_object()?.clone();

    Some(ToolCallRequest {
        name: name.to_string(),
        arguments,
        call_id: FALLBACK_CALL_ID.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, json};

    #[test]
    fn native_calls_take_precedence_over_json_text() {
        let message = Message::assistant(r#"{"name":"search_eda_kb","arguments":{}}"#)
            .with_tool_calls(vec![ToolCallRequest {
                name: "create_eda_plan".into(),
                arguments: Map::new(),
                call_id: "native-1".into(),
            }]);

        assert_eq!(route_message(&message), Route::ExecuteNative);
    }

    #[test]
    fn well_formed_json_request_normalizes() {
        let message = Message::assistant(
            r#"{"name":"search_eda_kb","arguments":{"query":"missing_values","top_k":3}}"#,
        );

        match route_message(&message) {
            Route::ExecuteAfterNormalize(upgraded) => {
                assert_eq!(upgraded.id, message.id);
                assert_eq!(upgraded.content, message.content);
                assert_eq!(upgraded.tool_calls.len(), 1);
                let call = &upgraded.tool_calls[0];
                assert_eq!(call.name, "search_eda_kb");
                assert_eq!(call.call_id, FALLBACK_CALL_ID);
                assert_eq!(call.arguments.get("top_k"), Some(&json!(3)));
            }
            other => panic!("expected normalization, got {other:?}"),
        }
    }

    #[test]
    fn missing_arguments_is_a_final_answer() {
        let message = Message::assistant(r#"{"name":"search_eda_kb"}"#);
        assert_eq!(route_message(&message), Route::FinalAnswer);
    }

    #[test]
    fn prose_is_a_final_answer() {
        let message = Message::assistant("Missing values are best handled by imputation.");
        assert_eq!(route_message(&message), Route::FinalAnswer);
    }

    #[test]
    fn non_object_json_is_a_final_answer() {
        assert_eq!(
            route_message(&Message::assistant(r#"["name","arguments"]"#)),
            Route::FinalAnswer
        );
        assert_eq!(
            route_message(&Message::assistant(r#""just a string""#)),
            Route::FinalAnswer
        );
    }

    #[test]
    fn wrong_argument_type_is_a_final_answer() {
        let message = Message::assistant(r#"{"name":"search_eda_kb","arguments":"query"}"#);
        assert_eq!(route_message(&message), Route::FinalAnswer);
    }

    #[test]
    fn fenced_json_is_a_final_answer() {
        // Only text that parses whole routes to a tool; fencing makes it
        // prose from the loop's point of view.
        let message = Message::assistant(
            "```json\n{\"name\":\"create_eda_plan\",\"arguments\":{\"goal\":\"trends\"}}\n```",
        );
        assert_eq!(route_message(&message), Route::FinalAnswer);
    }

    #[test]
    fn json_embedded_in_prose_is_a_final_answer() {
        let message = Message::assistant(
            r#"I would call {"name":"echo","arguments":{}} next if needed."#,
        );
        assert_eq!(route_message(&message), Route::FinalAnswer);
    }
}

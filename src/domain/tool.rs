use serde::Serialize;
use serde_json::Value;

/// Tool metadata advertised to the model alongside each chat request.
/// `parameters` is a JSON-schema-like object describing the tool input.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

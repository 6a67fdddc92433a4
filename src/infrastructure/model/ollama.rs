//! Ollama client implementation

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use super::adapter::MessageAdapter;
use super::base::HttpClientBase;
use super::traits::ModelProvider;
use super::types::{ModelError, ModelRequest, ModelResponse};
use crate::domain::message::{Message, ToolCallRequest};

/// Ollama client for local LLM chat with native function calling.
#[derive(Clone)]
pub struct OllamaClient {
    base: HttpClientBase,
}

impl OllamaClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            base: HttpClientBase::new("ollama", endpoint),
        }
    }
}

#[async_trait]
impl ModelProvider for OllamaClient {
    async fn chat(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
        let url = self.base.build_url("/api/chat");

        let payload = OllamaChatRequest {
            model: request.model.clone(),
            messages: MessageAdapter::to_ollama_format(&request.messages),
            tools: MessageAdapter::to_ollama_tools(&request.tools),
            stream: false,
        };

        info!(
            provider = self.base.id.as_str(),
            model = request.model.as_str(),
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Sending chat request to Ollama"
        );

        let response: OllamaChatResponse = self.base.post_json(&url, &payload).await?;
        debug!("Received chat response from Ollama");

        let wire = response
            .message
            .ok_or_else(|| ModelError::invalid_response(&self.base.id, "missing message"))?;

        // Ollama does not assign call ids; mint one per request so tool
        // results can be correlated back.
        let calls = wire
            .tool_calls
            .into_iter()
            .map(|call| ToolCallRequest {
                name: call.function.name,
                arguments: call.function.arguments,
                call_id: Uuid::new_v4().to_string(),
            })
            .collect();

        Ok(ModelResponse::new(
            Message::assistant(wire.content).with_tool_calls(calls),
        ))
    }
}

#[derive(Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: Option<OllamaMessage>,
}

#[derive(Deserialize)]
struct OllamaMessage {
    #[serde(default)]
    content: String,
    #[serde(default)]
    tool_calls: Vec<OllamaToolCall>,
}

#[derive(Deserialize)]
struct OllamaToolCall {
    function: OllamaFunction,
}

#[derive(Deserialize)]
struct OllamaFunction {
    name: String,
    #[serde(default)]
    arguments: Map<String, Value>,
}

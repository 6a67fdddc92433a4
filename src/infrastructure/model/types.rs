//! Model types - Request, Response, and Error types

use crate::domain::message::Message;
use crate::domain::tool::ToolDeclaration;
use thiserror::Error;

/// One chat turn sent to the model: the full ordered conversation plus the
/// declarations of every registered tool.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDeclaration>,
}

/// Exactly one new assistant message, which may carry text, native tool-call
/// requests, or both.
#[derive(Debug, Clone)]
pub struct ModelResponse {
    pub message: Message,
}

impl ModelResponse {
    pub fn new(message: Message) -> Self {
        Self { message }
    }
}

/// Transport and decoding failures are fatal for the current turn; retries,
/// if desired, belong to the caller.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("network error calling provider '{provider}': {source}")]
    Network {
        provider: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("provider '{provider}' returned invalid response: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

impl ModelError {
    pub fn network(provider: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            provider: provider.into(),
            source,
        }
    }

    pub fn invalid_response(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider: provider.into(),
            reason: reason.into(),
        }
    }
}

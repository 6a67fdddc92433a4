//! Model traits

use super::types::{ModelError, ModelRequest, ModelResponse};
use async_trait::async_trait;

/// Boundary to the language model backend. Implementations must be safe for
/// concurrent use by independent conversations.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Send a chat request and return the model's next assistant message.
    async fn chat(&self, request: ModelRequest) -> Result<ModelResponse, ModelError>;
}

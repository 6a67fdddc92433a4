use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::infrastructure::model::{HttpClientBase, ModelError};

/// Embedding boundary, used identically for indexing and querying.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ModelError>;
}

/// Ollama embedding client (`/api/embeddings`).
#[derive(Clone)]
pub struct OllamaEmbedder {
    base: HttpClientBase,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base: HttpClientBase::new("ollama-embeddings", endpoint),
            model: model.into(),
        }
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ModelError> {
        let url = self.base.build_url("/api/embeddings");
        let payload = EmbeddingRequest {
            model: self.model.clone(),
            prompt: text.to_string(),
        };

        let response: EmbeddingResponse = self.base.post_json(&url, &payload).await?;
        debug!(
            model = self.model.as_str(),
            dimensions = response.embedding.len(),
            "Received embedding from Ollama"
        );

        if response.embedding.is_empty() {
            return Err(ModelError::invalid_response(
                &self.base.id,
                "empty embedding vector",
            ));
        }

        Ok(response.embedding)
    }
}

#[derive(Serialize)]
struct EmbeddingRequest {
    model: String,
    prompt: String,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    embedding: Vec<f32>,
}

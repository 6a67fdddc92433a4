mod adapter;
mod base;
mod ollama;
mod traits;
mod types;

pub use adapter::MessageAdapter;
pub use base::HttpClientBase;
pub use ollama::OllamaClient;
pub use traits::ModelProvider;
pub use types::{ModelError, ModelRequest, ModelResponse};

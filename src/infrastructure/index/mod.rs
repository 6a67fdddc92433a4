mod embedder;
mod store;

pub use embedder::{Embedder, OllamaEmbedder};
pub use store::{IndexError, IndexRecord, JsonlIndex, RetrievalHit, SnippetMetadata, VectorIndex};

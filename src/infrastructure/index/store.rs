use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Metadata carried with every indexed segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnippetMetadata {
    pub doc_type: String,
    pub topic: String,
    pub source: String,
}

/// One ranked retrieval result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalHit {
    pub id: String,
    pub text: String,
    pub metadata: SnippetMetadata,
}

/// Persisted form of one indexed segment (one JSONL line).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexRecord {
    pub id: String,
    pub text: String,
    pub embedding: Vec<f32>,
    pub metadata: SnippetMetadata,
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("failed to read index from {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse index record at {path:?} line {line}: {source}")]
    Parse {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Nearest-neighbor lookup over embedding vectors, optionally narrowed to a
/// topic. Implementations must be safe for concurrent callers.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn query(
        &self,
        embedding: &[f32],
        top_k: usize,
        topic: Option<&str>,
    ) -> Result<Vec<RetrievalHit>, IndexError>;
}

/// In-memory index loaded from a JSONL file, ranked by cosine similarity.
#[derive(Debug, Default)]
pub struct JsonlIndex {
    records: Vec<IndexRecord>,
}

impl JsonlIndex {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<IndexRecord>) -> Self {
        Self { records }
    }

    pub fn load(path: &Path) -> Result<Self, IndexError> {
        debug!(path = %path.display(), "Loading vector index");
        let content = fs::read_to_string(path).map_err(|source| IndexError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut records = Vec::new();
        for (number, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record: IndexRecord =
                serde_json::from_str(line).map_err(|source| IndexError::Parse {
                    path: path.to_path_buf(),
                    line: number + 1,
                    source,
                })?;
            records.push(record);
        }

        info!(path = %path.display(), records = records.len(), "Vector index loaded");
        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl VectorIndex for JsonlIndex {
    async fn query(
        &self,
        embedding: &[f32],
        top_k: usize,
        topic: Option<&str>,
    ) -> Result<Vec<RetrievalHit>, IndexError> {
        let mut scored: Vec<(f32, &IndexRecord)> = self
            .records
            .iter()
            .filter(|record| match topic {
                Some(topic) => record.metadata.topic == topic,
                None => true,
            })
            .map(|record| (cosine_similarity(embedding, &record.embedding), record))
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(_, record)| RetrievalHit {
                id: record.id.clone(),
                text: record.text.clone(),
                metadata: record.metadata.clone(),
            })
            .collect())
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, topic: &str, embedding: Vec<f32>) -> IndexRecord {
        IndexRecord {
            id: id.into(),
            text: format!("text for {id}"),
            embedding,
            metadata: SnippetMetadata {
                doc_type: "eda_guideline".into(),
                topic: topic.into(),
                source: "eda_handbook".into(),
            },
        }
    }

    #[tokio::test]
    async fn ranks_by_cosine_similarity() {
        let index = JsonlIndex::from_records(vec![
            record("far", "workflow", vec![0.0, 1.0]),
            record("near", "workflow", vec![1.0, 0.05]),
        ]);

        let hits = index.query(&[1.0, 0.0], 2, None).await.expect("query");
        assert_eq!(hits[0].id, "near");
        assert_eq!(hits[1].id, "far");
    }

    #[tokio::test]
    async fn topic_filter_narrows_results() {
        let index = JsonlIndex::from_records(vec![
            record("a", "outliers", vec![1.0, 0.0]),
            record("b", "correlation", vec![1.0, 0.0]),
        ]);

        let hits = index
            .query(&[1.0, 0.0], 5, Some("correlation"))
            .await
            .expect("query");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "b");
    }

    #[tokio::test]
    async fn truncates_to_top_k() {
        let index = JsonlIndex::from_records(vec![
            record("a", "workflow", vec![1.0, 0.0]),
            record("b", "workflow", vec![0.9, 0.1]),
            record("c", "workflow", vec![0.0, 1.0]),
        ]);

        let hits = index.query(&[1.0, 0.0], 2, None).await.expect("query");
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn load_round_trips_jsonl() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("index.jsonl");
        let line = serde_json::to_string(&record("x", "workflow", vec![0.5, 0.5]))
            .expect("serialize record");
        fs::write(&path, format!("{line}\n")).expect("write index");

        let index = JsonlIndex::load(&path).expect("load");
        assert_eq!(index.len(), 1);
    }
}

use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::infrastructure::index::{Embedder, IndexRecord, SnippetMetadata};
use crate::infrastructure::model::ModelError;

pub const MAX_CHUNK_CHARS: usize = 1200;
pub const OVERLAP_CHARS: usize = 200;

static BLANK_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").expect("blank-run regex"));
static HORIZONTAL_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").expect("whitespace regex"));

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read knowledge base file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write index to {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Embedding(#[from] ModelError),
    #[error("failed to serialize index record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Normalizes raw document text: strips HTML tags when the document looks
/// like HTML, then collapses blank runs and horizontal whitespace.
pub fn clean_text(text: &str) -> String {
    let mut text = if text.to_lowercase().contains("<html") {
        strip_tags(text)
    } else {
        text.to_string()
    };

    text = text.replace('\r', "\n");
    let text = BLANK_RUNS.replace_all(&text, "\n\n");
    let text = HORIZONTAL_WS.replace_all(&text, " ");

    text.trim().to_string()
}

/// Splits text into paragraph-accumulating chunks of at most `max_chars`
/// characters, carrying an `overlap`-character tail into the next chunk.
pub fn chunk_text(text: &str, max_chars: usize, overlap: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for paragraph in text.split("\n\n") {
        if current.chars().count() + paragraph.chars().count() < max_chars {
            current.push_str("\n\n");
            current.push_str(paragraph);
        } else {
            let trimmed = current.trim();
            if !trimmed.is_empty() {
                chunks.push(trimmed.to_string());
            }
            let tail = char_tail(&current, overlap);
            current = format!("{tail}\n\n{paragraph}");
        }
    }

    let trimmed = current.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }

    chunks
}

/// Infers topic metadata from filename keywords.
pub fn infer_metadata(filename: &str) -> SnippetMetadata {
    let name = filename.to_lowercase();

    let topic = if name.contains("missing") {
        "missing_values"
    } else if name.contains("outlier") {
        "outliers"
    } else if name.contains("correlation") {
        "correlation"
    } else if name.contains("visual") {
        "visualization"
    } else if name.contains("workflow") {
        "workflow"
    } else {
        "eda_general"
    };

    SnippetMetadata {
        doc_type: "eda_guideline".to_string(),
        topic: topic.to_string(),
        source: "eda_handbook".to_string(),
    }
}

/// Walks `kb_dir` for `.txt` documents, chunks and embeds them, and writes
/// the JSONL index to `out_path`. Returns the number of indexed segments.
pub async fn build_index(
    kb_dir: &Path,
    out_path: &Path,
    embedder: &dyn Embedder,
) -> Result<usize, IngestError> {
    let mut files = Vec::new();
    collect_txt_files(kb_dir, &mut files)?;
    info!(kb_dir = %kb_dir.display(), files = files.len(), "Building knowledge base index");

    let mut lines = Vec::new();
    for path in &files {
        let raw = fs::read_to_string(path).map_err(|source| IngestError::Io {
            path: path.clone(),
            source,
        })?;

        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("unknown.txt");
        let metadata = infer_metadata(file_name);
        let cleaned = clean_text(&raw);
        let chunks = chunk_text(&cleaned, MAX_CHUNK_CHARS, OVERLAP_CHARS);

        if chunks.is_empty() {
            warn!(file = file_name, "Document produced no usable chunks");
            continue;
        }

        debug!(file = file_name, chunks = chunks.len(), topic = metadata.topic.as_str(), "Embedding document chunks");
        for (number, chunk) in chunks.into_iter().enumerate() {
            let embedding = embedder.embed(&chunk).await?;
            let record = IndexRecord {
                id: format!("{file_name}_{number}"),
                text: chunk,
                embedding,
                metadata: metadata.clone(),
            };
            lines.push(serde_json::to_string(&record)?);
        }
    }

    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent).map_err(|source| IngestError::Write {
            path: out_path.to_path_buf(),
            source,
        })?;
    }
    fs::write(out_path, lines.join("\n")).map_err(|source| IngestError::Write {
        path: out_path.to_path_buf(),
        source,
    })?;

    info!(path = %out_path.display(), records = lines.len(), "Knowledge base index written");
    Ok(lines.len())
}

fn collect_txt_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), IngestError> {
    let entries = fs::read_dir(dir).map_err(|source| IngestError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    for entry in entries {
        let entry = entry.map_err(|source| IngestError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_dir() {
            collect_txt_files(&path, files)?;
        } else if path.extension().and_then(|ext| ext.to_str()) == Some("txt") {
            files.push(path);
        }
    }

    files.sort();
    Ok(())
}

fn char_tail(text: &str, count: usize) -> String {
    let total = text.chars().count();
    text.chars().skip(total.saturating_sub(count)).collect()
}

fn strip_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for ch in text.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                out.push('\n');
            }
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_collapses_blank_runs_and_whitespace() {
        let cleaned = clean_text("a  b\t\tc\n\n\n\n\nd\r\ne");
        assert_eq!(cleaned, "a b c\n\nd\n\ne");
    }

    #[test]
    fn clean_text_strips_html_documents() {
        let cleaned = clean_text("<html><body><p>Check missing values</p></body></html>");
        assert!(cleaned.contains("Check missing values"));
        assert!(!cleaned.contains('<'));
    }

    #[test]
    fn chunk_text_respects_max_and_carries_overlap() {
        let paragraph = "x".repeat(80);
        let text = vec![paragraph.clone(); 4].join("\n\n");
        let chunks = chunk_text(&text, 100, 20);

        assert!(chunks.len() > 1);
        // Each later chunk starts with the tail of the previous accumulation.
        assert!(chunks[1].starts_with(&"x".repeat(20)));
    }

    #[test]
    fn chunk_text_keeps_short_text_whole() {
        let chunks = chunk_text("one\n\ntwo", 1200, 200);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], "one\n\ntwo");
    }

    #[tokio::test]
    async fn build_index_keeps_short_documents() {
        struct StubEmbedder;

        #[async_trait::async_trait]
        impl Embedder for StubEmbedder {
            async fn embed(&self, _text: &str) -> Result<Vec<f32>, ModelError> {
                Ok(vec![1.0, 0.0])
            }
        }

        let dir = tempfile::tempdir().expect("tempdir");
        let kb_dir = dir.path().join("kb");
        fs::create_dir_all(&kb_dir).expect("kb dir");
        fs::write(kb_dir.join("outlier_tip.txt"), "Use IQR fences to flag outliers.")
            .expect("write doc");
        let out_path = dir.path().join("data/index.jsonl");

        let count = build_index(&kb_dir, &out_path, &StubEmbedder)
            .await
            .expect("index builds");
        assert_eq!(count, 1);

        let content = fs::read_to_string(&out_path).expect("read index");
        let record: IndexRecord =
            serde_json::from_str(content.trim()).expect("record parses");
        assert_eq!(record.id, "outlier_tip.txt_0");
        assert_eq!(record.text, "Use IQR fences to flag outliers.");
        assert_eq!(record.metadata.topic, "outliers");
    }

    #[test]
    fn infer_metadata_maps_filename_keywords() {
        assert_eq!(infer_metadata("handling_missing_data.txt").topic, "missing_values");
        assert_eq!(infer_metadata("OUTLIER_notes.txt").topic, "outliers");
        assert_eq!(infer_metadata("correlation_basics.txt").topic, "correlation");
        assert_eq!(infer_metadata("visualization.txt").topic, "visualization");
        assert_eq!(infer_metadata("eda_workflow.txt").topic, "workflow");
        assert_eq!(infer_metadata("intro.txt").topic, "eda_general");
        assert_eq!(infer_metadata("intro.txt").doc_type, "eda_guideline");
        assert_eq!(infer_metadata("intro.txt").source, "eda_handbook");
    }
}

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tracing::debug;

use crate::application::tooling::{ToolError, ToolHandler, ToolSpec};
use crate::infrastructure::index::{Embedder, VectorIndex};

pub const SEARCH_TOOL_NAME: &str = "search_eda_kb";
pub const NO_RESULTS_MESSAGE: &str = "No relevant grounding found in KB.";

const MIN_QUERY_CHARS: usize = 3;
const MIN_TOP_K: i64 = 1;
const MAX_TOP_K: i64 = 8;
const DEFAULT_TOP_K: i64 = 3;

/// Grounded retrieval over the curated EDA knowledge base, with optional
/// topic filtering.
pub struct SearchKbTool {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
}

impl SearchKbTool {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self { embedder, index }
    }

    pub fn spec(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> ToolSpec {
        ToolSpec {
            name: SEARCH_TOOL_NAME.to_string(),
            description: "Use this tool when you need grounded EDA guidance (steps, best \
                          practices, definitions) from the project's curated knowledge base. \
                          Supports optional topic filtering. Returns the most relevant chunks \
                          as text."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "minLength": MIN_QUERY_CHARS,
                        "description": "User question to search in EDA knowledge base."
                    },
                    "top_k": {
                        "type": "integer",
                        "minimum": MIN_TOP_K,
                        "maximum": MAX_TOP_K,
                        "default": DEFAULT_TOP_K,
                        "description": "Number of retrieved chunks to return."
                    },
                    "topic": {
                        "type": "string",
                        "description": "Optional metadata filter. Examples: 'missing_values', \
                                        'correlation', 'workflow', 'visualization', 'eda_general'."
                    }
                },
                "required": ["query"]
            }),
            handler: Arc::new(Self::new(embedder, index)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
    #[serde(default = "default_top_k")]
    top_k: i64,
    #[serde(default)]
    topic: Option<String>,
}

fn default_top_k() -> i64 {
    DEFAULT_TOP_K
}

fn parse_args(arguments: Map<String, Value>) -> Result<SearchArgs, ToolError> {
    let args: SearchArgs = serde_json::from_value(Value::Object(arguments))
        .map_err(|err| ToolError::invalid_arguments(SEARCH_TOOL_NAME, vec![err.to_string()]))?;

    let mut violations = Vec::new();
    if args.query.chars().count() < MIN_QUERY_CHARS {
        violations.push(format!("query must be at least {MIN_QUERY_CHARS} characters"));
    }
    if !(MIN_TOP_K..=MAX_TOP_K).contains(&args.top_k) {
        violations.push(format!("top_k must be between {MIN_TOP_K} and {MAX_TOP_K}"));
    }

    if violations.is_empty() {
        Ok(args)
    } else {
        Err(ToolError::invalid_arguments(SEARCH_TOOL_NAME, violations))
    }
}

#[async_trait]
impl ToolHandler for SearchKbTool {
    async fn call(&self, arguments: Map<String, Value>) -> Result<String, ToolError> {
        let args = parse_args(arguments)?;

        let embedding = self
            .embedder
            .embed(&args.query)
            .await
            .map_err(|err| ToolError::execution(SEARCH_TOOL_NAME, err))?;

        let hits = self
            .index
            .query(&embedding, args.top_k as usize, args.topic.as_deref())
            .await
            .map_err(|err| ToolError::execution(SEARCH_TOOL_NAME, err))?;

        debug!(
            query = args.query.as_str(),
            topic = args.topic.as_deref(),
            hits = hits.len(),
            "Knowledge base query completed"
        );

        if hits.is_empty() {
            return Ok(NO_RESULTS_MESSAGE.to_string());
        }

        // Compact, model-friendly grounded context.
        let mut lines = vec!["GROUNDING RESULTS:".to_string()];
        for (number, hit) in hits.iter().enumerate() {
            let snippet = hit.text.trim().replace('\n', " ");
            lines.push(format!(
                "{}) ({}, topic={}, source={}) {}",
                number + 1,
                hit.metadata.doc_type,
                hit.metadata.topic,
                hit.metadata.source,
                snippet
            ));
        }

        Ok(lines.join("\n"))
    }
}

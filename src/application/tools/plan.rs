use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::sync::Arc;

use crate::application::tooling::{ToolError, ToolHandler, ToolSpec};

pub const PLAN_TOOL_NAME: &str = "create_eda_plan";

const MIN_GOAL_CHARS: usize = 3;

/// Fixed workflow steps. Deterministic output keeps the tool reliable and
/// testable.
const PLAN_STEPS: [&str; 8] = [
    "Check dataset shape, data types, and basic schema validation",
    "Compute missing values per column and decide handling approach",
    "Compute summary statistics for numeric columns",
    "Check distributions (histograms / density) for numeric columns",
    "Detect outliers (IQR / boxplots) for key numeric columns",
    "Check correlations between numeric columns (correlation matrix / heatmap)",
    "Visualize key relationships (scatter plots) based on goal",
    "Summarize insights and potential data quality issues",
];

const RECOMMENDED_PLOTS: [&str; 5] = [
    "Missing values bar chart",
    "Histograms for numeric columns",
    "Boxplots for outlier inspection",
    "Correlation heatmap",
    "Scatter plots for top correlated pairs",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdaPlan {
    pub goal: String,
    pub steps: Vec<String>,
    pub recommended_plots: Vec<String>,
    pub columns_seen: Vec<String>,
}

impl EdaPlan {
    pub fn build(goal: String, columns: Vec<String>) -> Self {
        Self {
            goal,
            steps: PLAN_STEPS.iter().map(|step| step.to_string()).collect(),
            recommended_plots: RECOMMENDED_PLOTS
                .iter()
                .map(|plot| plot.to_string())
                .collect(),
            columns_seen: columns,
        }
    }
}

/// Deterministic action tool: no external I/O, the goal and columns echoed
/// back verbatim around a fixed plan.
pub struct EdaPlanTool;

impl EdaPlanTool {
    pub fn spec() -> ToolSpec {
        ToolSpec {
            name: PLAN_TOOL_NAME.to_string(),
            description: "Use this tool to generate a clean step-by-step EDA plan (tasks + \
                          recommended plots) given dataset columns and a user goal."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "dataset_columns": {
                        "type": "array",
                        "items": { "type": "string" },
                        "minItems": 1,
                        "description": "List of dataset column names."
                    },
                    "goal": {
                        "type": "string",
                        "minLength": MIN_GOAL_CHARS,
                        "description": "What the user wants to learn from EDA (e.g., trends, \
                                        anomalies, relationships)."
                    }
                },
                "required": ["dataset_columns", "goal"]
            }),
            handler: Arc::new(Self),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PlanArgs {
    dataset_columns: Vec<String>,
    goal: String,
}

fn parse_args(arguments: Map<String, Value>) -> Result<PlanArgs, ToolError> {
    let args: PlanArgs = serde_json::from_value(Value::Object(arguments))
        .map_err(|err| ToolError::invalid_arguments(PLAN_TOOL_NAME, vec![err.to_string()]))?;

    let mut violations = Vec::new();
    if args.dataset_columns.is_empty() {
        violations.push("dataset_columns must not be empty".to_string());
    }
    if args.goal.chars().count() < MIN_GOAL_CHARS {
        violations.push(format!("goal must be at least {MIN_GOAL_CHARS} characters"));
    }

    if violations.is_empty() {
        Ok(args)
    } else {
        Err(ToolError::invalid_arguments(PLAN_TOOL_NAME, violations))
    }
}

#[async_trait]
impl ToolHandler for EdaPlanTool {
    async fn call(&self, arguments: Map<String, Value>) -> Result<String, ToolError> {
        let args = parse_args(arguments)?;
        let plan = EdaPlan::build(args.goal, args.dataset_columns);
        serde_json::to_string_pretty(&plan)
            .map_err(|err| ToolError::execution(PLAN_TOOL_NAME, err))
    }
}

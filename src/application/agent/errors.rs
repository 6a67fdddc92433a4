use crate::infrastructure::model::ModelError;
use thiserror::Error;

/// Only model-transport failures and a configured turn cap stop the loop;
/// tool-layer failures are surfaced to the model as data.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("agent exceeded the configured turn limit of {limit}")]
    TurnLimit { limit: usize },
}

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::errors::AgentError;
use super::extractor::{Route, route_message};
use super::models::{AgentOptions, AgentOutcome, AgentStep};
use crate::application::tooling::ToolRegistry;
use crate::domain::message::{Conversation, Message, ToolCallRequest};
use crate::infrastructure::model::{ModelProvider, ModelRequest};

/// Loop states. `End` is the only terminal state; `Tools` always hands
/// control back to `Agent`.
#[derive(Debug)]
enum LoopState {
    Agent,
    Normalize(Message),
    Tools(Vec<ToolCallRequest>),
    End,
}

pub struct Agent<P: ModelProvider> {
    provider: Arc<P>,
    registry: Arc<ToolRegistry>,
    model: String,
    system_prompt: String,
}

impl<P: ModelProvider> Agent<P> {
    pub fn new(
        provider: Arc<P>,
        registry: Arc<ToolRegistry>,
        model: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            registry,
            model: model.into(),
            system_prompt: system_prompt.into(),
        }
    }

    pub async fn run(
        &self,
        prompt: String,
        options: AgentOptions,
    ) -> Result<AgentOutcome, AgentError> {
        info!("Agent run started");
        let model = options.model.unwrap_or_else(|| self.model.clone());
        let system_prompt = options
            .system_prompt
            .unwrap_or_else(|| self.system_prompt.clone());
        let declarations = self.registry.declarations();

        let mut conversation = Conversation::new();
        conversation.merge(Message::human(prompt));

        let mut steps: Vec<AgentStep> = Vec::new();
        let mut turns = 0usize;
        let mut state = LoopState::Agent;

        loop {
            state = match state {
                LoopState::Agent => {
                    if let Some(limit) = options.max_turns {
                        if turns >= limit {
                            warn!(limit, "Agent exceeded the configured turn limit");
                            return Err(AgentError::TurnLimit { limit });
                        }
                    }
                    turns += 1;

                    conversation.ensure_system(&system_prompt);
                    debug!(
                        turn = turns,
                        history = conversation.len(),
                        "Submitting agent turn to model provider"
                    );
                    let response = self
                        .provider
                        .chat(ModelRequest {
                            model: model.clone(),
                            messages: conversation.messages().to_vec(),
                            tools: declarations.clone(),
                        })
                        .await?;
                    let message = response.message;

                    match route_message(&message) {
                        Route::ExecuteNative => {
                            let calls = message.tool_calls.clone();
                            conversation.merge(message);
                            LoopState::Tools(calls)
                        }
                        Route::ExecuteAfterNormalize(upgraded) => {
                            conversation.merge(message);
                            LoopState::Normalize(upgraded)
                        }
                        Route::FinalAnswer => {
                            conversation.merge(message);
                            LoopState::End
                        }
                    }
                }
                LoopState::Normalize(upgraded) => {
                    // Same id as the plain-text turn, so the merge replaces
                    // it instead of duplicating the turn in history.
                    let calls = upgraded.tool_calls.clone();
                    if let Some(call) = calls.first() {
                        debug!(tool = %call.name, "Normalized textual tool request");
                    }
                    conversation.merge(upgraded);
                    LoopState::Tools(calls)
                }
                LoopState::Tools(calls) => {
                    for call in &calls {
                        info!(tool = %call.name, "Agent requested tool execution");
                        let execution = self.registry.dispatch(call).await;
                        steps.push(AgentStep::from(&execution));
                        conversation.merge(execution.to_message());
                    }
                    LoopState::Agent
                }
                LoopState::End => break,
            };
        }

        let response = conversation.last_assistant_text().to_string();
        info!(turns, steps = steps.len(), "Agent returned final response");
        Ok(AgentOutcome {
            response,
            steps,
            messages: conversation.into_messages(),
        })
    }
}

//! Tool-looping engine implementation.
//!
//! Drives the model to a final text answer: each round offers the tool
//! catalog, executes any requested tools, feeds the results back, and
//! re-invokes. The round count is bounded; once exhausted the model gets
//! one last completion with no tools offered, so it must answer in text.

use super::{EngineError, LlmClient, LlmRequest, ReasoningEngine};
use crate::message::{Message, Role};
use crate::tools::{ToolOutput, ToolRegistry};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

/// Upper bound on tool-call rounds within a single turn.
const DEFAULT_MAX_TOOL_ROUNDS: usize = 5;

pub struct AgentEngine {
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
    max_tool_rounds: usize,
}

impl AgentEngine {
    pub fn new(llm: Arc<dyn LlmClient>, tools: ToolRegistry) -> Self {
        Self {
            llm,
            tools,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
        }
    }

    #[allow(dead_code)] // Tuning knob, exercised in tests
    pub fn with_max_tool_rounds(mut self, max_tool_rounds: usize) -> Self {
        self.max_tool_rounds = max_tool_rounds;
        self
    }

    async fn complete(&self, request: &LlmRequest) -> Result<super::LlmResponse, EngineError> {
        let start = Instant::now();
        let result = self.llm.complete(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::info!(
                    model = %self.llm.model_id(),
                    duration_ms = %duration.as_millis(),
                    input_tokens = response.usage.input_tokens,
                    output_tokens = response.usage.output_tokens,
                    end_turn = response.end_turn,
                    "Model request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.llm.model_id(),
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    retryable = e.kind.is_retryable(),
                    "Model request failed"
                );
            }
        }

        result
    }
}

#[async_trait]
impl ReasoningEngine for AgentEngine {
    async fn invoke(&self, history: &[Message]) -> Result<Vec<Message>, EngineError> {
        // The system instruction travels out-of-band; everything else is
        // conversational history.
        let system = history
            .iter()
            .find(|m| m.role == Role::System)
            .map(Message::text);
        let mut working: Vec<Message> = history
            .iter()
            .filter(|m| m.role != Role::System)
            .cloned()
            .collect();

        let mut produced = Vec::new();
        let mut rounds = 0;

        loop {
            let offer_tools = rounds < self.max_tool_rounds;
            let request = LlmRequest {
                system: system.clone(),
                messages: working.clone(),
                tools: if offer_tools {
                    self.tools.definitions()
                } else {
                    Vec::new()
                },
                max_tokens: None,
            };

            let response = self.complete(&request).await?;
            let tool_uses: Vec<(String, String, serde_json::Value)> = response
                .tool_uses()
                .into_iter()
                .map(|(id, name, input)| (id.to_string(), name.to_string(), input.clone()))
                .collect();

            let assistant = Message::assistant(response.content);
            working.push(assistant.clone());
            produced.push(assistant);

            if tool_uses.is_empty() || !offer_tools {
                break;
            }

            for (id, name, input) in tool_uses {
                let output = match self.tools.execute(&name, input).await {
                    Some(output) => output,
                    None => ToolOutput::error(format!("Unknown tool: {name}")),
                };
                tracing::info!(
                    tool = %name,
                    success = output.success,
                    "Tool executed"
                );
                let result = Message::tool_result(id, output.output, !output.success);
                working.push(result.clone());
                produced.push(result);
            }

            rounds += 1;
        }

        Ok(produced)
    }
}

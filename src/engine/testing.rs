//! Mock implementations for testing
//!
//! These mocks enable exercising the orchestrator and HTTP handlers
//! without real model I/O.

use super::{EngineError, LlmClient, LlmRequest, LlmResponse, ReasoningEngine};
use crate::message::Message;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Mock model client that returns queued responses
pub struct MockLlmClient {
    responses: Mutex<VecDeque<Result<LlmResponse, EngineError>>>,
    model_id: String,
    /// Record of all requests made
    pub requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlmClient {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            model_id: model_id.into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful response
    pub fn queue_response(&self, response: LlmResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    /// Queue an error response
    pub fn queue_error(&self, error: EngineError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, EngineError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(EngineError::network("No mock response queued")))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Mock reasoning engine with scripted turn results
pub struct MockEngine {
    results: Mutex<VecDeque<Result<Vec<Message>, EngineError>>>,
    /// Record of the histories each invocation received
    pub invocations: Mutex<Vec<Vec<Message>>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            results: Mutex::new(VecDeque::new()),
            invocations: Mutex::new(Vec::new()),
        }
    }

    /// Queue a plain-text assistant reply
    pub fn queue_reply(&self, text: impl Into<String>) {
        self.results
            .lock()
            .unwrap()
            .push_back(Ok(vec![Message::assistant_text(text)]));
    }

    /// Queue a full ordered message batch
    pub fn queue_messages(&self, messages: Vec<Message>) {
        self.results.lock().unwrap().push_back(Ok(messages));
    }

    /// Queue an engine failure
    pub fn queue_error(&self, error: EngineError) {
        self.results.lock().unwrap().push_back(Err(error));
    }

    /// Number of times `invoke` was called
    pub fn call_count(&self) -> usize {
        self.invocations.lock().unwrap().len()
    }

    /// Histories seen by each invocation
    pub fn recorded_invocations(&self) -> Vec<Vec<Message>> {
        self.invocations.lock().unwrap().clone()
    }
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReasoningEngine for MockEngine {
    async fn invoke(&self, history: &[Message]) -> Result<Vec<Message>, EngineError> {
        self.invocations.lock().unwrap().push(history.to_vec());
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(EngineError::network("No mock result queued")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Usage;
    use crate::message::ContentPart;

    #[tokio::test]
    async fn test_mock_llm_client_queues_and_records() {
        let mock = MockLlmClient::new("test-model");
        mock.queue_response(LlmResponse {
            content: vec![ContentPart::text("Hello")],
            end_turn: true,
            usage: Usage::default(),
        });

        let request = LlmRequest {
            system: None,
            messages: vec![],
            tools: vec![],
            max_tokens: Some(100),
        };

        let response = mock.complete(&request).await.unwrap();
        assert_eq!(response.text(), "Hello");
        assert_eq!(mock.recorded_requests().len(), 1);

        // Second call should fail (no more responses)
        assert!(mock.complete(&request).await.is_err());
    }

    #[tokio::test]
    async fn test_mock_engine_records_history() {
        let engine = MockEngine::new();
        engine.queue_reply("hi there");

        let history = vec![Message::user(vec![ContentPart::text("hi")])];
        let produced = engine.invoke(&history).await.unwrap();

        assert_eq!(produced[0].text(), "hi there");
        assert_eq!(engine.call_count(), 1);
        assert_eq!(engine.recorded_invocations()[0].len(), 1);
    }
}

//! Reasoning engine abstraction.
//!
//! The engine is an opaque collaborator: given the full ordered history of
//! a thread it returns the ordered batch of new messages (tool calls, tool
//! results, final assistant reply). Tool iteration happens entirely inside
//! the engine; callers never see a partial loop.

mod agent;
mod error;
mod gemini;
mod types;

#[cfg(test)]
pub mod testing;

pub use agent::AgentEngine;
pub use error::{EngineError, EngineErrorKind};
pub use gemini::GeminiClient;
pub use types::*;

use crate::message::Message;
use async_trait::async_trait;

/// Produces the new messages for one conversational turn.
#[async_trait]
pub trait ReasoningEngine: Send + Sync {
    async fn invoke(&self, history: &[Message]) -> Result<Vec<Message>, EngineError>;
}

/// Client for a single model completion request.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Complete a request
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, EngineError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

#[async_trait]
impl<T: ReasoningEngine + ?Sized> ReasoningEngine for std::sync::Arc<T> {
    async fn invoke(&self, history: &[Message]) -> Result<Vec<Message>, EngineError> {
        (**self).invoke(history).await
    }
}

#[async_trait]
impl<T: LlmClient + ?Sized> LlmClient for std::sync::Arc<T> {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, EngineError> {
        (**self).complete(request).await
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}

//! HTTP API for the conversational backend.

mod handlers;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::engine::ReasoningEngine;
use crate::session::SessionOrchestrator;
use crate::store::TranscriptStore;
use crate::system_prompt::SYSTEM_PROMPT;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<SessionOrchestrator>,
}

impl AppState {
    pub fn new(store: Arc<dyn TranscriptStore>, engine: Arc<dyn ReasoningEngine>) -> Self {
        Self {
            orchestrator: Arc::new(SessionOrchestrator::new(store, engine, SYSTEM_PROMPT)),
        }
    }
}

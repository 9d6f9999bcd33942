//! Session orchestration.
//!
//! One `handle_turn` call is one conversational turn: fetch history, seed
//! the system instruction on the first turn, invoke the reasoning engine,
//! persist the whole batch atomically, return the reply text. Turns on the
//! same thread id are serialized so appends cannot interleave.

use crate::engine::{EngineError, ReasoningEngine};
use crate::message::{ContentPart, Message};
use crate::store::{StoreError, StoredMessage, TranscriptStore};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("{0}")]
    Engine(#[from] EngineError),
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

pub struct SessionOrchestrator {
    store: Arc<dyn TranscriptStore>,
    engine: Arc<dyn ReasoningEngine>,
    system_prompt: String,
    thread_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SessionOrchestrator {
    pub fn new(
        store: Arc<dyn TranscriptStore>,
        engine: Arc<dyn ReasoningEngine>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            store,
            engine,
            system_prompt: system_prompt.into(),
            thread_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Lock guarding all turns for one thread id.
    async fn lock_for(&self, thread_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.thread_locks.lock().await;
        locks
            .entry(thread_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Run one turn for `thread_id` with the user's content parts.
    ///
    /// The batch (user message, any tool traffic, the assistant reply) is
    /// persisted all-or-nothing: an engine failure leaves the transcript
    /// untouched.
    pub async fn handle_turn(
        &self,
        thread_id: &str,
        parts: Vec<ContentPart>,
    ) -> Result<String, SessionError> {
        let lock = self.lock_for(thread_id).await;
        let _guard = lock.lock().await;

        let transcript = self.store.get(thread_id).await?;

        let mut batch = Vec::new();
        if transcript.is_empty() {
            batch.push(Message::system(self.system_prompt.clone()));
        }
        batch.push(Message::user(parts));

        let mut history: Vec<Message> =
            transcript.into_iter().map(|m| m.message).collect();
        history.extend(batch.iter().cloned());

        let produced = self.engine.invoke(&history).await?;
        let reply = produced
            .last()
            .map(Message::text)
            .ok_or_else(|| EngineError::unknown("Reasoning engine returned no messages"))?;

        batch.extend(produced);
        self.store.append(thread_id, &batch).await?;

        tracing::info!(
            thread_id = %thread_id,
            appended = batch.len(),
            "Turn completed"
        );
        Ok(reply)
    }

    /// Stored transcript for `thread_id` (empty for unseen keys).
    pub async fn transcript(&self, thread_id: &str) -> Result<Vec<StoredMessage>, SessionError> {
        Ok(self.store.get(thread_id).await?)
    }
}

//! Transcript storage.
//!
//! A transcript is the ordered, append-only message history of one thread.
//! Threads come into existence on first append; reading an unseen key
//! yields an empty transcript, never an error.

mod memory;
mod sqlite;

#[cfg(test)]
mod proptests;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::message::Message;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Invalid message content: {0}")]
    InvalidContent(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A message plus its storage envelope.
#[derive(Debug, Clone, Serialize)]
pub struct StoredMessage {
    pub id: String,
    pub thread_id: String,
    pub sequence_id: i64,
    #[serde(flatten)]
    pub message: Message,
    pub created_at: DateTime<Utc>,
}

/// Keyed, append-only transcript storage.
///
/// Implementations must make `append` atomic: the whole batch lands with
/// contiguous sequence ids or nothing does. Reads isolate corruption to the
/// affected row (skip and warn) rather than failing the transcript.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Transcript for `thread_id` in sequence order; empty for unseen keys.
    async fn get(&self, thread_id: &str) -> StoreResult<Vec<StoredMessage>>;

    /// Append `messages` at the end of the thread's transcript, creating
    /// the thread if absent. Returns the stored envelopes in order.
    async fn append(&self, thread_id: &str, messages: &[Message]) -> StoreResult<Vec<StoredMessage>>;
}

#[async_trait]
impl<T: TranscriptStore + ?Sized> TranscriptStore for std::sync::Arc<T> {
    async fn get(&self, thread_id: &str) -> StoreResult<Vec<StoredMessage>> {
        (**self).get(thread_id).await
    }

    async fn append(
        &self,
        thread_id: &str,
        messages: &[Message],
    ) -> StoreResult<Vec<StoredMessage>> {
        (**self).append(thread_id, messages).await
    }
}

//! In-memory transcript store.
//!
//! Process-lifetime storage: transcripts live as long as the server does.
//! Also the backend tests run against.

use super::{StoreResult, StoredMessage, TranscriptStore};
use crate::message::Message;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryStore {
    threads: Mutex<HashMap<String, Vec<StoredMessage>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TranscriptStore for MemoryStore {
    async fn get(&self, thread_id: &str) -> StoreResult<Vec<StoredMessage>> {
        Ok(self
            .threads
            .lock()
            .unwrap()
            .get(thread_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn append(
        &self,
        thread_id: &str,
        messages: &[Message],
    ) -> StoreResult<Vec<StoredMessage>> {
        let mut threads = self.threads.lock().unwrap();
        let transcript = threads.entry(thread_id.to_string()).or_default();
        let now = Utc::now();

        let mut sequence_id = transcript.last().map_or(0, |m| m.sequence_id);
        let mut stored = Vec::with_capacity(messages.len());
        for message in messages {
            sequence_id += 1;
            let entry = StoredMessage {
                id: uuid::Uuid::new_v4().to_string(),
                thread_id: thread_id.to_string(),
                sequence_id,
                message: message.clone(),
                created_at: now,
            };
            transcript.push(entry.clone());
            stored.push(entry);
        }
        Ok(stored)
    }
}

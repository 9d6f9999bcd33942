//! SQLite-backed transcript store.

use super::{StoreResult, StoredMessage, TranscriptStore};
use crate::message::{Message, MessageContent, Role};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// SQL schema for initialization
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS threads (
    id TEXT PRIMARY KEY,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS messages (
    id TEXT PRIMARY KEY,
    thread_id TEXT NOT NULL,
    sequence_id INTEGER NOT NULL,
    role TEXT NOT NULL,
    content TEXT NOT NULL,
    created_at TEXT NOT NULL,

    FOREIGN KEY (thread_id) REFERENCES threads(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_messages_thread ON messages(thread_id, sequence_id);
"#;

/// Thread-safe store handle backed by a single SQLite connection.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open or create the database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }
}

fn parse_role(s: &str) -> Role {
    match s {
        "system" => Role::System,
        "user" => Role::User,
        "assistant" => Role::Assistant,
        "tool" => Role::Tool,
        _ => Role::Assistant,
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[async_trait]
impl TranscriptStore for SqliteStore {
    async fn get(&self, thread_id: &str) -> StoreResult<Vec<StoredMessage>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, thread_id, sequence_id, role, content, created_at
             FROM messages WHERE thread_id = ?1 ORDER BY sequence_id ASC",
        )?;

        let rows = stmt.query_map(params![thread_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut messages = Vec::new();
        for row in rows {
            let (id, thread_id, sequence_id, role, content, created_at) = row?;
            // Per-message isolation: a row with undecodable content is
            // skipped, not fatal for the transcript.
            let content: MessageContent = match serde_json::from_str(&content) {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!(
                        message_id = %id,
                        thread_id = %thread_id,
                        error = %e,
                        "Skipping message with undecodable content"
                    );
                    continue;
                }
            };
            messages.push(StoredMessage {
                id,
                thread_id,
                sequence_id,
                message: Message {
                    role: parse_role(&role),
                    content,
                },
                created_at: parse_datetime(&created_at),
            });
        }
        Ok(messages)
    }

    async fn append(
        &self,
        thread_id: &str,
        messages: &[Message],
    ) -> StoreResult<Vec<StoredMessage>> {
        let mut conn = self.conn.lock().unwrap();
        let now = Utc::now();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO threads (id, created_at, updated_at) VALUES (?1, ?2, ?2)
             ON CONFLICT(id) DO UPDATE SET updated_at = ?2",
            params![thread_id, now.to_rfc3339()],
        )?;

        let mut sequence_id: i64 = tx.query_row(
            "SELECT COALESCE(MAX(sequence_id), 0) FROM messages WHERE thread_id = ?1",
            params![thread_id],
            |row| row.get(0),
        )?;

        let mut stored = Vec::with_capacity(messages.len());
        for message in messages {
            sequence_id += 1;
            let id = uuid::Uuid::new_v4().to_string();
            let content = serde_json::to_string(&message.content)
                .map_err(|e| super::StoreError::InvalidContent(e.to_string()))?;

            tx.execute(
                "INSERT INTO messages (id, thread_id, sequence_id, role, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    id,
                    thread_id,
                    sequence_id,
                    message.role.to_string(),
                    content,
                    now.to_rfc3339(),
                ],
            )?;

            stored.push(StoredMessage {
                id,
                thread_id: thread_id.to_string(),
                sequence_id,
                message: message.clone(),
                created_at: now,
            });
        }

        tx.commit()?;
        Ok(stored)
    }
}

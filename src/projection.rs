//! Read-side transcript projection.
//!
//! Turns the stored transcript into the display-ready message list the UI
//! consumes: user/assistant turns only, one text string each, plus the
//! first image attachment rendered as a data URI.

use crate::message::{ContentPart, MessageContent, Role};
use crate::store::StoredMessage;
use serde::Serialize;

/// Display-ready view of one transcript entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectedMessage {
    pub role: &'static str,
    pub content: String,
    pub image: Option<String>,
}

/// Project a stored transcript for display.
///
/// System and tool messages are internal and dropped. Only the first text
/// part and the first image part of a multi-part message are surfaced;
/// the image is always rendered with an image/jpeg data URI prefix, and
/// file/audio parts are not surfaced at all (both quirks of the original
/// read path, kept intentionally).
pub fn project(transcript: &[StoredMessage]) -> Vec<ProjectedMessage> {
    transcript
        .iter()
        .filter_map(|stored| project_message(&stored.message.role, &stored.message.content))
        .collect()
}

fn project_message(role: &Role, content: &MessageContent) -> Option<ProjectedMessage> {
    let role = match role {
        Role::System | Role::Tool => return None,
        Role::User => "user",
        Role::Assistant => "assistant",
    };

    match content {
        MessageContent::Text(text) => Some(ProjectedMessage {
            role,
            content: text.clone(),
            image: None,
        }),
        MessageContent::Parts(parts) => {
            let text = parts
                .iter()
                .find_map(|p| match p {
                    ContentPart::Text { text } => Some(text.clone()),
                    _ => None,
                })
                .unwrap_or_default();
            let image = parts.iter().find_map(|p| match p {
                ContentPart::Image { data, .. } => {
                    Some(format!("data:image/jpeg;base64,{data}"))
                }
                _ => None,
            });
            Some(ProjectedMessage {
                role,
                content: text,
                image,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;
    use crate::store::{MemoryStore, TranscriptStore};

    async fn stored(messages: Vec<Message>) -> Vec<StoredMessage> {
        let store = MemoryStore::new();
        store.append("t", &messages).await.unwrap();
        store.get("t").await.unwrap()
    }

    #[tokio::test]
    async fn test_empty_transcript_projects_empty() {
        assert!(project(&[]).is_empty());
    }

    #[tokio::test]
    async fn test_system_and_tool_messages_are_dropped() {
        let transcript = stored(vec![
            Message::system("internal instructions"),
            Message::user(vec![ContentPart::text("hi")]),
            Message::tool_result("c1", "tool output", false),
            Message::assistant_text("hello"),
        ])
        .await;

        let projected = project(&transcript);
        assert_eq!(projected.len(), 2);
        assert_eq!(projected[0].role, "user");
        assert_eq!(projected[1].role, "assistant");
    }

    #[tokio::test]
    async fn test_image_attachment_becomes_data_uri() {
        let transcript = stored(vec![Message::user(vec![
            ContentPart::text("look"),
            ContentPart::image("image/png", "aGVsbG8="),
        ])])
        .await;

        let projected = project(&transcript);
        assert_eq!(projected[0].content, "look");
        // MIME is fixed at image/jpeg regardless of the upload type.
        assert_eq!(
            projected[0].image.as_deref(),
            Some("data:image/jpeg;base64,aGVsbG8=")
        );
    }

    #[tokio::test]
    async fn test_file_and_audio_parts_are_not_surfaced() {
        let transcript = stored(vec![Message::user(vec![
            ContentPart::text("summarize"),
            ContentPart::file("application/pdf", "cGRm"),
            ContentPart::audio("audio/wav", "d2F2"),
        ])])
        .await;

        let projected = project(&transcript);
        assert_eq!(projected[0].content, "summarize");
        assert_eq!(projected[0].image, None);
    }

    #[tokio::test]
    async fn test_first_text_and_first_image_win() {
        let transcript = stored(vec![Message::user(vec![
            ContentPart::image("image/jpeg", "Zmlyc3Q="),
            ContentPart::text("first text"),
            ContentPart::text("second text"),
            ContentPart::image("image/jpeg", "c2Vjb25k"),
        ])])
        .await;

        let projected = project(&transcript);
        assert_eq!(projected[0].content, "first text");
        assert_eq!(
            projected[0].image.as_deref(),
            Some("data:image/jpeg;base64,Zmlyc3Q=")
        );
    }

    #[tokio::test]
    async fn test_assistant_tool_call_projects_with_empty_text() {
        let transcript = stored(vec![Message::assistant(vec![ContentPart::tool_use(
            "c1",
            "web_search",
            serde_json::json!({"query": "x"}),
        )])])
        .await;

        let projected = project(&transcript);
        assert_eq!(projected.len(), 1);
        assert_eq!(projected[0].role, "assistant");
        assert_eq!(projected[0].content, "");
    }

    #[tokio::test]
    async fn test_order_is_preserved() {
        let transcript = stored(vec![
            Message::user(vec![ContentPart::text("one")]),
            Message::assistant_text("two"),
            Message::user(vec![ContentPart::text("three")]),
            Message::assistant_text("four"),
        ])
        .await;

        let projected = project(&transcript);
        let texts: Vec<&str> = projected.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(texts, vec!["one", "two", "three", "four"]);
    }
}

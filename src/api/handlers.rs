//! HTTP request handlers

use super::types::{ErrorResponse, ReplyResponse, TranscriptErrorResponse, TranscriptResponse};
use super::AppState;
use crate::message::ContentPart;
use crate::projection::project;
use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::prelude::{Engine as _, BASE64_STANDARD};
use serde::Deserialize;
use std::path::PathBuf;
use tower_http::services::{ServeDir, ServeFile};

/// Uploads (documents, audio) are routinely larger than axum's 2 MB default.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Create the API router. `static_dir` holds the built frontend; unmatched
/// routes fall back to it with an index.html rewrite for client-side paths.
pub fn create_router(state: AppState, static_dir: PathBuf) -> Router {
    let spa = ServeDir::new(&static_dir).fallback(ServeFile::new(static_dir.join("index.html")));

    Router::new()
        .route("/chat", post(send_chat).get(get_chat))
        .route("/version", get(get_version))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .fallback_service(spa)
        .with_state(state)
}

// ============================================================
// Chat Turn
// ============================================================

/// Accumulated multipart fields of one chat request.
#[derive(Debug, Default)]
struct ChatForm {
    message: String,
    url: String,
    thread_id: Option<String>,
    image: Option<(String, String)>,
    document: Option<(String, String)>,
    audio: Option<(String, String)>,
}

impl ChatForm {
    fn is_empty(&self) -> bool {
        self.message.trim().is_empty()
            && self.url.trim().is_empty()
            && self.image.is_none()
            && self.document.is_none()
            && self.audio.is_none()
    }

    /// Build the ordered content parts: text first, attachments after.
    fn into_parts(self) -> Vec<ContentPart> {
        let mut text = self.message;
        let url = self.url.trim();
        if !url.is_empty() {
            let instruction =
                format!("Please analyze and summarize the content from this URL: {url}");
            if text.trim().is_empty() {
                text = instruction;
            } else {
                text = format!("{text}\n\n{instruction}");
            }
        }

        let mut parts = vec![ContentPart::text(text)];
        if let Some((mime_type, data)) = self.image {
            parts.push(ContentPart::image(mime_type, data));
        }
        if let Some((mime_type, data)) = self.document {
            parts.push(ContentPart::file(mime_type, data));
        }
        if let Some((mime_type, data)) = self.audio {
            parts.push(ContentPart::audio(mime_type, data));
        }
        parts
    }
}

async fn read_form(mut multipart: Multipart) -> Result<ChatForm, AppError> {
    let mut form = ChatForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "message" => {
                form.message = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Invalid message field: {e}")))?;
            }
            "url" => {
                form.url = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Invalid url field: {e}")))?;
            }
            "thread_id" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Invalid thread_id field: {e}")))?;
                if !value.is_empty() {
                    form.thread_id = Some(value);
                }
            }
            "image" => form.image = read_binary_field(field, "image/jpeg").await?,
            "document" => form.document = read_binary_field(field, "application/pdf").await?,
            "audio" => form.audio = read_binary_field(field, "audio/wav").await?,
            _ => {}
        }
    }

    Ok(form)
}

/// Read a file field as (mime type, base64 payload); empty uploads count
/// as absent.
async fn read_binary_field(
    field: axum::extract::multipart::Field<'_>,
    default_mime: &str,
) -> Result<Option<(String, String)>, AppError> {
    let mime_type = field
        .content_type()
        .map_or_else(|| default_mime.to_string(), ToString::to_string);
    let bytes = field
        .bytes()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid file upload: {e}")))?;
    if bytes.is_empty() {
        return Ok(None);
    }
    Ok(Some((mime_type, BASE64_STANDARD.encode(&bytes))))
}

async fn send_chat(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ReplyResponse>, AppError> {
    let form = read_form(multipart).await?;

    if form.is_empty() {
        return Err(AppError::BadRequest(
            "Please provide a message, image, document, audio, or URL".to_string(),
        ));
    }

    let thread_id = form.thread_id.clone().unwrap_or_else(|| "1".to_string());
    let parts = form.into_parts();

    let reply = state
        .orchestrator
        .handle_turn(&thread_id, parts)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(ReplyResponse { reply }))
}

// ============================================================
// Transcript Read
// ============================================================

fn default_thread_id() -> String {
    "1".to_string()
}

#[derive(Debug, Deserialize)]
struct ThreadQuery {
    #[serde(default = "default_thread_id")]
    thread_id: String,
}

async fn get_chat(State(state): State<AppState>, Query(query): Query<ThreadQuery>) -> Response {
    match state.orchestrator.transcript(&query.thread_id).await {
        Ok(transcript) => Json(TranscriptResponse {
            messages: project(&transcript),
        })
        .into_response(),
        Err(e) => {
            tracing::error!(thread_id = %query.thread_id, error = %e, "Transcript read failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(TranscriptErrorResponse {
                    error: e.to_string(),
                    messages: Vec::new(),
                }),
            )
                .into_response()
        }
    }
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("parley ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

enum AppError {
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}

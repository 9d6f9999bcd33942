//! API response types

use crate::projection::ProjectedMessage;
use serde::Serialize;

/// Response for a completed chat turn
#[derive(Debug, Serialize)]
pub struct ReplyResponse {
    pub reply: String,
}

/// Response with a thread's projected transcript
#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    pub messages: Vec<ProjectedMessage>,
}

/// Failure shape for transcript reads: the UI always gets a messages list
#[derive(Debug, Serialize)]
pub struct TranscriptErrorResponse {
    pub error: String,
    pub messages: Vec<ProjectedMessage>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

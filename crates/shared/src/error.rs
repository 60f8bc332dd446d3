use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::FALLBACK_PROCESSING_ERROR;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Processing,
    Transport,
}

/// JSON payload of a failed `/remove` response: `{"error": "..."}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
        }
    }
}

/// Extracts the server-provided message from a failure body.
///
/// Unparseable bodies and a missing or empty `error` field yield the generic
/// fallback; the parse error itself is dropped.
pub fn error_message_from_body(body: &[u8]) -> String {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.error)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| FALLBACK_PROCESSING_ERROR.to_string())
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind:?}: {message}")]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ClassifiedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Status-area text shown for processing and transport failures.
    pub fn status_text(&self) -> String {
        format!("Error: {}", self.message)
    }
}

#[cfg(test)]
#[path = "tests/error_tests.rs"]
mod tests;

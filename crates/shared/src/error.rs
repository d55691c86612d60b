use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse classification of a failed API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthorized,
    NotFound,
    Validation,
    PayloadTooLarge,
    Unavailable,
    Internal,
}

impl ErrorCode {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Unauthorized,
            404 => Self::NotFound,
            400 | 409 | 422 => Self::Validation,
            413 => Self::PayloadTooLarge,
            408 | 429 | 502 | 503 | 504 => Self::Unavailable,
            _ => Self::Internal,
        }
    }
}

/// A failed API call as reported by the server.
#[derive(Debug, Clone, Error)]
#[error("{code:?}: {message}")]
pub struct ApiException {
    pub code: ErrorCode,
    /// HTTP status, when the failure came from a response.
    pub status: Option<u16>,
    pub message: String,
}

impl ApiException {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            status: None,
            message: message.into(),
        }
    }

    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::from_status(status),
            status: Some(status),
            message: message.into(),
        }
    }
}

//! Error codes shared by every service, and their JSON rendering.
//!
//! DESIGN
//! ======
//! Each service owns a `thiserror` enum. Handlers never match on message
//! text: they ask the error for its stable code and HTTP status, then render
//! a uniform `{code, message, retryable}` body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;

/// Stable machine-readable classification for service errors.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

/// JSON body returned for failed API calls.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub retryable: bool,
}

impl ApiError {
    #[must_use]
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self { status, code, message: message.into(), retryable: false }
    }

    /// Build from any coded error, keeping its display text as the message.
    #[must_use]
    pub fn from_err(status: StatusCode, err: &(impl ErrorCode + ?Sized)) -> Self {
        Self { status, code: err.error_code(), message: err.to_string(), retryable: err.retryable() }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;

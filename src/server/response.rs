//! JSON response envelope shared by every route.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::error::DeployhookError;

/// Body of every response: `{"error": 0|1, "message": ...}`, plus
/// `warnings` when cleanup advisories were recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployResponse {
    /// `0` on success, `1` on failure.
    pub error: u8,
    /// Human-readable outcome.
    pub message: String,
    /// Non-fatal cleanup problems.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl DeployResponse {
    /// A successful outcome.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            error: 0,
            message: message.into(),
            warnings: Vec::new(),
        }
    }

    /// A failed outcome.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            error: 1,
            message: message.into(),
            warnings: Vec::new(),
        }
    }

    /// Attach advisory warnings.
    #[must_use]
    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    /// Whether this response reports success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.error == 0
    }
}

impl IntoResponse for DeployResponse {
    fn into_response(self) -> Response {
        let status = if self.is_success() {
            StatusCode::OK
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(self)).into_response()
    }
}

impl IntoResponse for DeployhookError {
    fn into_response(self) -> Response {
        DeployResponse::failure(self.to_string()).into_response()
    }
}

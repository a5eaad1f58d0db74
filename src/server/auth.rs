//! Request authorisation.

use std::fmt;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::AppState;
use crate::error::{DeployhookError, RequestError};

/// Header carrying the shared secret.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Result of an authorisation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthDecision {
    /// Let the request through.
    Allow,
    /// Reject the request.
    Deny,
}

/// Decides whether a request may reach the handlers.
pub trait Authorizer: Send + Sync {
    /// Inspect the request headers and decide.
    fn authorize(&self, headers: &HeaderMap) -> AuthDecision;
}

/// Accepts every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl Authorizer for AllowAll {
    fn authorize(&self, _headers: &HeaderMap) -> AuthDecision {
        AuthDecision::Allow
    }
}

/// Requires [`API_KEY_HEADER`] to equal a configured secret.
#[derive(Clone)]
pub struct SharedSecret {
    secret: String,
}

impl SharedSecret {
    /// Require `secret` on every request.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedSecret")
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl Authorizer for SharedSecret {
    fn authorize(&self, headers: &HeaderMap) -> AuthDecision {
        let presented = headers
            .get(API_KEY_HEADER)
            .map(|value| value.as_bytes())
            .unwrap_or_default();

        if constant_time_eq(presented, self.secret.as_bytes()) {
            AuthDecision::Allow
        } else {
            AuthDecision::Deny
        }
    }
}

/// Pick the authoriser for an optional configured secret. A missing or blank
/// secret disables authorisation.
#[must_use]
pub fn authorizer_for(api_key: Option<&str>) -> Arc<dyn Authorizer> {
    match api_key.filter(|key| !key.is_empty()) {
        Some(key) => Arc::new(SharedSecret::new(key)),
        None => Arc::new(AllowAll),
    }
}

/// Compare without short-circuiting on the first differing byte.
fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    left.iter()
        .zip(right)
        .fold(0_u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}

/// Middleware rejecting requests the configured [`Authorizer`] denies.
pub(super) async fn require_authorization(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    match state.authorizer().authorize(request.headers()) {
        AuthDecision::Allow => next.run(request).await,
        AuthDecision::Deny => {
            tracing::warn!(uri = %request.uri(), "rejected request with missing or wrong api key");
            DeployhookError::from(RequestError::Unauthorized).into_response()
        }
    }
}

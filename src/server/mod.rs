//! HTTP surface.
//!
//! `POST /` accepts a JSON deploy request and answers with a
//! [`DeployResponse`]. `GET /healthz` pings the container engine. Both routes
//! sit behind the configured [`Authorizer`].

mod auth;
mod handlers;
mod response;

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::deploy::Provisioner;

pub use auth::{API_KEY_HEADER, AllowAll, AuthDecision, Authorizer, SharedSecret, authorizer_for};
pub use handlers::STARTED_MESSAGE;
pub use response::DeployResponse;

/// State shared with handlers.
#[derive(Clone)]
pub struct AppState {
    provisioner: Arc<Provisioner>,
    authorizer: Arc<dyn Authorizer>,
}

impl AppState {
    /// Bundle the provisioner with the request authoriser.
    #[must_use]
    pub fn new(provisioner: Arc<Provisioner>, authorizer: Arc<dyn Authorizer>) -> Self {
        Self {
            provisioner,
            authorizer,
        }
    }

    /// The provisioner deploy requests are handed to.
    #[must_use]
    pub fn provisioner(&self) -> &Provisioner {
        &self.provisioner
    }

    /// The authoriser guarding every route.
    #[must_use]
    pub fn authorizer(&self) -> &dyn Authorizer {
        self.authorizer.as_ref()
    }
}

/// Build the router with request tracing and authorisation applied.
#[must_use]
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", post(handlers::deploy))
        .route("/healthz", get(handlers::healthz))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_authorization,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve `router` on `listener` until `shutdown` resolves, then drain
/// in-flight requests.
///
/// # Errors
///
/// Returns the I/O error that stopped the accept loop.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(address) = listener.local_addr() {
        tracing::info!(%address, "deploy webhook listening");
    }
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}

/// Resolve on `SIGINT` or, on Unix, `SIGTERM`.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(%error, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown requested");
}

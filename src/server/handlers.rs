//! Route handlers.

use axum::body::Bytes;
use axum::extract::State;

use super::AppState;
use super::response::DeployResponse;
use crate::deploy::{ContainerSpec, DeployRequest};
use crate::engine::EngineConnector;
use crate::error::DeployhookError;

/// Message returned after a successful deploy.
pub const STARTED_MESSAGE: &str = "Container Started";

/// `POST /`: deploy the container described by the JSON body.
pub(super) async fn deploy(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<DeployResponse, DeployhookError> {
    let spec = DeployRequest::from_json(&body)
        .and_then(ContainerSpec::try_from)
        .inspect_err(|error| tracing::warn!(%error, "rejected deploy request"))?;

    let report = state.provisioner().deploy(&spec).await?;
    Ok(DeployResponse::success(STARTED_MESSAGE).with_warnings(report.advisories().to_vec()))
}

/// `GET /healthz`: ping the container engine.
pub(super) async fn healthz(
    State(state): State<AppState>,
) -> Result<DeployResponse, DeployhookError> {
    EngineConnector::health_check(state.provisioner().engine()).await?;
    Ok(DeployResponse::success("OK"))
}

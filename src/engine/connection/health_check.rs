//! Engine health checks used at start-up and by the `/healthz` route.

use std::time::Duration;

use bollard::Docker;

use super::{EngineConnector, HEALTH_CHECK_TIMEOUT_SECS};
use crate::engine::ContainerEngine;
use crate::error::{ContainerError, DeployhookError};

impl EngineConnector {
    /// Verify the container engine answers a ping within the health-check
    /// timeout.
    ///
    /// # Errors
    ///
    /// Returns `ContainerError::HealthCheckFailed` if the engine does not
    /// respond correctly.
    ///
    /// Returns `ContainerError::HealthCheckTimeout` if the check times out.
    pub async fn health_check<C: ContainerEngine + ?Sized>(
        engine: &C,
    ) -> Result<(), DeployhookError> {
        let timeout = Duration::from_secs(HEALTH_CHECK_TIMEOUT_SECS);

        tokio::time::timeout(timeout, engine.ping())
            .await
            .map_err(|_| ContainerError::HealthCheckTimeout {
                seconds: HEALTH_CHECK_TIMEOUT_SECS,
            })?
            .map_err(|error| ContainerError::HealthCheckFailed {
                message: error.to_string(),
            })?;
        Ok(())
    }

    /// Connect to the container engine and verify it responds.
    ///
    /// # Errors
    ///
    /// Returns a `ContainerError` if the connection or the health check fails.
    pub async fn connect_and_verify(socket: &str) -> Result<Docker, DeployhookError> {
        let docker = Self::connect(socket)?;
        Self::health_check(&docker).await?;
        Ok(docker)
    }
}

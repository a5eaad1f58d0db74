//! Container (re)provisioning.
//!
//! [`Provisioner::deploy`] drives the engine through a fixed sequence for one
//! [`ContainerSpec`]:
//!
//! 1. check the image comes from the allowed registry
//! 2. resolve registry credentials
//! 3. pull the image, draining progress to the log
//! 4. stop and remove any container with the same name (best effort)
//! 5. create the container
//! 6. start it
//!
//! The first failure outside step 4 ends the deploy. Cleanup failures are
//! recorded as advisories on the returned [`DeployReport`].

mod host_config;
mod spec;
mod units;

use std::sync::Arc;

use bollard::auth::DockerCredentials;
use bollard::models::CreateImageInfo;
use futures_util::StreamExt;
use tracing::Instrument;

use crate::credentials::CredentialStore;
use crate::engine::ContainerEngine;
use crate::error::{ContainerError, DeployhookError, RequestError};

pub use spec::{
    ContainerSpec, DeployRequest, PortBinding, PortBindingRequest, ResourceLimits, VolumeBinding,
    VolumeBindingRequest,
};
pub use units::{parse_cpu_shares, parse_memory_bytes};

/// Which images may be deployed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryPolicy {
    host: String,
}

impl RegistryPolicy {
    /// Allow images hosted on `host` (for example `d.puneet.cc`).
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }

    /// The allowed registry hostname.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Whether `image` names a repository on the allowed registry.
    ///
    /// The hostname must be followed by `/` or a `:port`, so
    /// `d.puneet.cc:5000/app` is allowed and `d.puneet.cc.evil.io/app` is
    /// refused for host `d.puneet.cc`.
    #[must_use]
    pub fn allows(&self, image: &str) -> bool {
        let Some(rest) = image.strip_prefix(self.host.as_str()) else {
            return false;
        };
        if rest.starts_with('/') {
            return true;
        }
        rest.strip_prefix(':')
            .and_then(|after| after.split_once('/'))
            .is_some_and(|(port, _)| !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()))
    }
}

/// Outcome of a successful deploy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployReport {
    container_id: String,
    advisories: Vec<String>,
}

impl DeployReport {
    /// ID of the started container.
    #[must_use]
    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    /// Non-fatal problems met while removing the previous container.
    #[must_use]
    pub fn advisories(&self) -> &[String] {
        &self.advisories
    }
}

/// Replaces named containers with freshly pulled ones.
pub struct Provisioner {
    engine: Arc<dyn ContainerEngine>,
    credentials: Arc<dyn CredentialStore>,
    policy: RegistryPolicy,
}

impl Provisioner {
    /// Build a provisioner over an engine client and credential store.
    #[must_use]
    pub fn new(
        engine: Arc<dyn ContainerEngine>,
        credentials: Arc<dyn CredentialStore>,
        policy: RegistryPolicy,
    ) -> Self {
        Self {
            engine,
            credentials,
            policy,
        }
    }

    /// The engine client deploys run against.
    #[must_use]
    pub fn engine(&self) -> &dyn ContainerEngine {
        self.engine.as_ref()
    }

    /// Pull `spec.image()` and (re)start the container `spec.name()`.
    ///
    /// # Errors
    ///
    /// Returns `RequestError::ImageNotAllowed` before touching the engine
    /// when the image is not on the allowed registry.
    ///
    /// Returns `CredentialError` when registry credentials cannot be
    /// resolved.
    ///
    /// Returns `ContainerError::PullFailed`, `ContainerError::CreateFailed`,
    /// or `ContainerError::StartFailed` when the corresponding engine call
    /// fails.
    pub async fn deploy(&self, spec: &ContainerSpec) -> Result<DeployReport, DeployhookError> {
        let span = tracing::info_span!("deploy", container = spec.name(), image = spec.image());
        let result = self.run(spec).instrument(span.clone()).await;
        span.in_scope(|| match &result {
            Ok(report) => tracing::info!(
                container_id = report.container_id(),
                advisories = report.advisories().len(),
                "container started"
            ),
            Err(error) => tracing::error!(%error, "deploy failed"),
        });
        result
    }

    async fn run(&self, spec: &ContainerSpec) -> Result<DeployReport, DeployhookError> {
        if !self.policy.allows(spec.image()) {
            return Err(RequestError::ImageNotAllowed {
                registry: String::from(self.policy.host()),
            }
            .into());
        }

        let credentials = self.credentials.resolve(self.policy.host()).await?;
        self.pull(spec.image(), credentials)
            .instrument(tracing::info_span!("pull"))
            .await?;

        let advisories = self.remove_existing(spec.name()).await;

        let created = self
            .engine
            .create_container(
                host_config::build_create_options(spec),
                host_config::build_create_body(spec),
            )
            .await
            .map_err(|error| ContainerError::CreateFailed {
                container: String::from(spec.name()),
                message: error.to_string(),
            })?;
        tracing::info!(container_id = %created.id, "container created");

        self.engine
            .start_container(&created.id)
            .await
            .map_err(|error| ContainerError::StartFailed {
                container_id: created.id.clone(),
                message: error.to_string(),
            })?;

        Ok(DeployReport {
            container_id: created.id,
            advisories,
        })
    }

    async fn pull(
        &self,
        image: &str,
        credentials: Option<DockerCredentials>,
    ) -> Result<(), DeployhookError> {
        tracing::info!(
            authenticated = credentials.is_some(),
            "pulling image"
        );

        let mut progress = self.engine.pull_image(image, credentials);
        while let Some(item) = progress.next().await {
            let info = item.map_err(|error| ContainerError::PullFailed {
                image: String::from(image),
                message: error.to_string(),
            })?;
            tracing::debug!(
                status = info.status.as_deref().unwrap_or_default(),
                layer = info.id.as_deref().unwrap_or_default(),
                progress = layer_progress(&info).as_deref().unwrap_or_default(),
                "pull progress"
            );
        }

        tracing::info!("image pulled");
        Ok(())
    }

    /// Stop and remove the container called `name` if it exists, returning
    /// one advisory per failed step.
    async fn remove_existing(&self, name: &str) -> Vec<String> {
        let mut advisories = Vec::new();

        match self.engine.inspect_container(name).await {
            Ok(None) => {
                tracing::info!("no previous container to remove");
                return advisories;
            }
            Ok(Some(_)) => {}
            Err(error) => {
                record(
                    &mut advisories,
                    &ContainerError::InspectFailed {
                        container: String::from(name),
                        message: error.to_string(),
                    },
                );
            }
        }

        if let Err(error) = self.engine.stop_container(name).await {
            record(
                &mut advisories,
                &ContainerError::StopFailed {
                    container: String::from(name),
                    message: error.to_string(),
                },
            );
        }
        if let Err(error) = self.engine.remove_container(name).await {
            record(
                &mut advisories,
                &ContainerError::RemoveFailed {
                    container: String::from(name),
                    message: error.to_string(),
                },
            );
        }

        if advisories.is_empty() {
            tracing::info!("previous container removed");
        }
        advisories
    }
}

/// `current/total` bytes for a layer download, when the engine reports them.
fn layer_progress(info: &CreateImageInfo) -> Option<String> {
    let detail = info.progress_detail.as_ref()?;
    match (detail.current, detail.total) {
        (Some(current), Some(total)) => Some(format!("{current}/{total}")),
        (Some(current), None) => Some(current.to_string()),
        _ => None,
    }
}

fn record(advisories: &mut Vec<String>, error: &ContainerError) {
    tracing::warn!(%error, "cleanup step failed; continuing");
    advisories.push(error.to_string());
}

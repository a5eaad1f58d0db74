//! Container lifecycle operations behind a mockable engine seam.
//!
//! [`ContainerEngine`] covers the calls the provisioner makes: image pull,
//! inspect, stop, remove, create, and start. The `Bollard` client implements
//! it directly; tests substitute mocks or in-memory fakes.

use std::future::Future;
use std::pin::Pin;

use bollard::Docker;
use bollard::auth::DockerCredentials;
use bollard::errors::Error as BollardError;
use bollard::models::{
    ContainerCreateBody, ContainerCreateResponse, ContainerInspectResponse, CreateImageInfo,
};
use bollard::query_parameters::{
    CreateContainerOptions, CreateImageOptions, InspectContainerOptions, RemoveContainerOptions,
    StartContainerOptions, StopContainerOptions,
};
use futures_util::Stream;

const NOT_FOUND_STATUS: u16 = 404;

/// Boxed future type returned by [`ContainerEngine`] implementors.
pub type EngineFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, BollardError>> + Send + 'a>>;

/// Boxed stream of image-pull progress messages.
pub type PullProgressStream<'a> =
    Pin<Box<dyn Stream<Item = Result<CreateImageInfo, BollardError>> + Send + 'a>>;

/// Behaviour required from a container engine to (re)provision a container.
///
/// Implementations must be safe to share between concurrent requests.
pub trait ContainerEngine: Send + Sync {
    /// Check that the engine answers API requests.
    fn ping(&self) -> EngineFuture<'_, ()>;

    /// Pull `image`, yielding progress messages until the pull completes.
    fn pull_image(
        &self,
        image: &str,
        credentials: Option<DockerCredentials>,
    ) -> PullProgressStream<'_>;

    /// Inspect a container by name. Resolves to `None` when it does not exist.
    fn inspect_container(&self, name: &str) -> EngineFuture<'_, Option<ContainerInspectResponse>>;

    /// Stop a container using the engine's default grace period.
    fn stop_container(&self, name: &str) -> EngineFuture<'_, ()>;

    /// Remove a stopped container.
    fn remove_container(&self, name: &str) -> EngineFuture<'_, ()>;

    /// Create a container from `Bollard` options and body payload.
    fn create_container(
        &self,
        options: CreateContainerOptions,
        body: ContainerCreateBody,
    ) -> EngineFuture<'_, ContainerCreateResponse>;

    /// Start a created container by ID.
    fn start_container(&self, container_id: &str) -> EngineFuture<'_, ()>;
}

impl ContainerEngine for Docker {
    fn ping(&self) -> EngineFuture<'_, ()> {
        Box::pin(async move { Self::ping(self).await.map(|_| ()) })
    }

    fn pull_image(
        &self,
        image: &str,
        credentials: Option<DockerCredentials>,
    ) -> PullProgressStream<'_> {
        let options = CreateImageOptions {
            from_image: Some(String::from(image)),
            ..CreateImageOptions::default()
        };
        Box::pin(self.create_image(Some(options), None, credentials))
    }

    fn inspect_container(&self, name: &str) -> EngineFuture<'_, Option<ContainerInspectResponse>> {
        let name_owned = String::from(name);
        Box::pin(async move {
            match Self::inspect_container(self, &name_owned, None::<InspectContainerOptions>).await
            {
                Ok(response) => Ok(Some(response)),
                Err(error) if is_not_found(&error) => Ok(None),
                Err(error) => Err(error),
            }
        })
    }

    fn stop_container(&self, name: &str) -> EngineFuture<'_, ()> {
        let name_owned = String::from(name);
        Box::pin(async move {
            Self::stop_container(self, &name_owned, None::<StopContainerOptions>).await
        })
    }

    fn remove_container(&self, name: &str) -> EngineFuture<'_, ()> {
        let name_owned = String::from(name);
        Box::pin(async move {
            Self::remove_container(self, &name_owned, None::<RemoveContainerOptions>).await
        })
    }

    fn create_container(
        &self,
        options: CreateContainerOptions,
        body: ContainerCreateBody,
    ) -> EngineFuture<'_, ContainerCreateResponse> {
        Box::pin(async move { Self::create_container(self, Some(options), body).await })
    }

    fn start_container(&self, container_id: &str) -> EngineFuture<'_, ()> {
        let id_owned = String::from(container_id);
        Box::pin(async move {
            Self::start_container(self, &id_owned, None::<StartContainerOptions>).await
        })
    }
}

/// Returns whether the engine reported that the target does not exist.
#[must_use]
pub const fn is_not_found(error: &BollardError) -> bool {
    matches!(
        error,
        BollardError::DockerResponseServerError {
            status_code: NOT_FOUND_STATUS,
            ..
        }
    )
}

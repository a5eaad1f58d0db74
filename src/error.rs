//! Semantic error types for the deployhook service.
//!
//! This module defines the error hierarchy for deployhook, following the
//! principle of using semantic error enums (via `thiserror`) for conditions the
//! caller might inspect or map to an HTTP response, while reserving opaque
//! errors (`eyre::Report`) for the binary boundary.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be parsed.
    #[error("failed to parse configuration file: {message}")]
    ParseError {
        /// A description of the parse error.
        message: String,
    },

    /// A configuration value failed validation.
    #[error("invalid configuration value for '{field}': {reason}")]
    InvalidValue {
        /// The name of the invalid field.
        field: String,
        /// The reason the value is invalid.
        reason: String,
    },

    /// The `OrthoConfig` library returned an error during configuration loading.
    #[error("configuration loading failed: {0}")]
    OrthoConfig(Arc<ortho_config::OrthoError>),
}

/// Errors raised by the container engine or while talking to it.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// Failed to connect to the container engine socket.
    #[error("failed to connect to container engine: {message}")]
    ConnectionFailed {
        /// A description of the connection failure.
        message: String,
    },

    /// The container engine socket was not found.
    #[error("container engine socket not found: {path}")]
    SocketNotFound {
        /// The path where the socket was expected.
        path: PathBuf,
    },

    /// Permission denied when accessing the container engine socket.
    #[error("permission denied accessing container socket: {path}")]
    PermissionDenied {
        /// The path to the socket.
        path: PathBuf,
    },

    /// Health check failed - engine did not respond correctly.
    #[error("container engine health check failed: {message}")]
    HealthCheckFailed {
        /// A description of the health check failure.
        message: String,
    },

    /// Health check timed out.
    #[error("container engine health check timed out after {seconds} seconds")]
    HealthCheckTimeout {
        /// The timeout duration in seconds.
        seconds: u64,
    },

    /// The image pull request or its progress stream failed.
    #[error("failed to pull image '{image}': {message}")]
    PullFailed {
        /// The image reference being pulled.
        image: String,
        /// A description of the pull failure.
        message: String,
    },

    /// Inspecting an existing container failed for a reason other than absence.
    #[error("failed to inspect container '{container}': {message}")]
    InspectFailed {
        /// The container name.
        container: String,
        /// A description of the inspect failure.
        message: String,
    },

    /// Failed to stop a container.
    #[error("failed to stop container '{container}': {message}")]
    StopFailed {
        /// The container name.
        container: String,
        /// A description of the stop failure.
        message: String,
    },

    /// Failed to remove a container.
    #[error("failed to remove container '{container}': {message}")]
    RemoveFailed {
        /// The container name.
        container: String,
        /// A description of the removal failure.
        message: String,
    },

    /// Failed to create a container.
    #[error("failed to create container '{container}': {message}")]
    CreateFailed {
        /// The requested container name.
        container: String,
        /// A description of the creation failure.
        message: String,
    },

    /// Failed to start a container.
    #[error("failed to start container '{container_id}': {message}")]
    StartFailed {
        /// The ID of the container that failed to start.
        container_id: String,
        /// A description of the start failure.
        message: String,
    },
}

/// Errors that can occur while resolving registry credentials.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The Docker client configuration exists but could not be read.
    #[error("failed to read registry credentials from '{path}': {message}")]
    ConfigUnreadable {
        /// The configuration file path.
        path: PathBuf,
        /// A description of the read failure.
        message: String,
    },

    /// The Docker client configuration is not valid JSON of the expected shape.
    #[error("malformed registry credential configuration '{path}': {message}")]
    ConfigMalformed {
        /// The configuration file path.
        path: PathBuf,
        /// A description of the parse failure.
        message: String,
    },

    /// A stored `auth` entry could not be decoded.
    #[error("invalid stored credentials for registry '{registry}': {message}")]
    InvalidAuth {
        /// The registry hostname.
        registry: String,
        /// A description of the decoding failure.
        message: String,
    },

    /// A `docker-credential-*` helper failed.
    #[error("credential helper '{helper}' failed: {message}")]
    HelperFailed {
        /// The helper program name.
        helper: String,
        /// A description of the helper failure.
        message: String,
    },
}

/// Errors raised while parsing resource-limit strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A memory limit string could not be parsed.
    #[error("invalid memory limit '{value}': {reason}")]
    InvalidMemory {
        /// The rejected input.
        value: String,
        /// Why the input was rejected.
        reason: String,
    },

    /// A CPU-share string could not be parsed.
    #[error("invalid cpu shares '{value}': {reason}")]
    InvalidCpuShares {
        /// The rejected input.
        value: String,
        /// Why the input was rejected.
        reason: String,
    },
}

/// Errors describing a deploy request that is rejected before provisioning.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// The request body did not parse into a deploy request.
    #[error("malformed deploy request: {message}")]
    Malformed {
        /// A description of the problem.
        message: String,
    },

    /// The requested image is not hosted by the allowed registry.
    #[error("only {registry} images supported")]
    ImageNotAllowed {
        /// The allowed registry hostname.
        registry: String,
    },

    /// The caller did not present the configured shared secret.
    #[error("Unauthorised Access")]
    Unauthorized,
}

/// Top-level error type for the deployhook service.
///
/// This enum aggregates all domain-specific errors into a single type. At the
/// HTTP boundary it becomes a failure response; at the binary boundary it is
/// converted to `eyre::Report`.
#[derive(Debug, Error)]
pub enum DeployhookError {
    /// An error occurred during configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An error occurred during container engine operations.
    #[error(transparent)]
    Container(#[from] ContainerError),

    /// Registry credentials could not be resolved.
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// A resource-limit string could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The request was malformed or not authorised.
    #[error(transparent)]
    Request(#[from] RequestError),
}

impl DeployhookError {
    /// Returns whether the error denies access rather than reporting a fault.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            Self::Request(RequestError::ImageNotAllowed { .. } | RequestError::Unauthorized)
        )
    }
}

/// A specialised `Result` type for deployhook operations.
pub type Result<T> = std::result::Result<T, DeployhookError>;

//! Deploy request wire format and the validated container specification.
//!
//! [`DeployRequest`] mirrors the JSON body accepted by the webhook.
//! [`ContainerSpec`] is the validated form handed to the provisioner: names are
//! checked, ports normalised, and resource-limit strings parsed.

use serde::{Deserialize, Serialize};

use super::units::{parse_cpu_shares, parse_memory_bytes};
use crate::error::{DeployhookError, RequestError};

const DEFAULT_PORT_PROTOCOL: &str = "tcp";

/// A single `{container, host}` port binding in a deploy request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PortBindingRequest {
    /// Container port, optionally with protocol (`80/tcp`).
    pub container: String,
    /// Host port to publish on all interfaces.
    pub host: String,
}

/// A single `{source, target}` bind mount in a deploy request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct VolumeBindingRequest {
    /// Host path.
    pub source: String,
    /// Path inside the container.
    pub target: String,
}

/// JSON body of a deploy request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployRequest {
    /// Container name.
    pub name: String,
    /// Image reference, including the registry host.
    pub image: String,
    /// Optional command override.
    #[serde(default)]
    pub custom_command: Option<Vec<String>>,
    /// Port bindings.
    #[serde(default)]
    pub port_bindings: Option<Vec<PortBindingRequest>>,
    /// Volume bindings.
    #[serde(default)]
    pub volume_bindings: Option<Vec<VolumeBindingRequest>>,
    /// Environment entries in `KEY=VALUE` form.
    #[serde(default)]
    pub environment: Option<Vec<String>>,
    /// Memory limit such as `512MB`.
    #[serde(default)]
    pub memory: Option<String>,
    /// CPU-share weight such as `512`.
    #[serde(default)]
    pub cpu_shares: Option<String>,
}

impl DeployRequest {
    /// Parse a request from a JSON body.
    ///
    /// # Errors
    ///
    /// Returns `RequestError::Malformed` when the body is not a JSON object of
    /// the expected shape.
    pub fn from_json(body: &[u8]) -> Result<Self, DeployhookError> {
        serde_json::from_slice(body).map_err(|error| {
            DeployhookError::from(RequestError::Malformed {
                message: error.to_string(),
            })
        })
    }
}

/// Container port published on a host port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortBinding {
    container_port: String,
    host_port: String,
}

impl PortBinding {
    /// Create a binding, appending `/tcp` when the container port has no
    /// protocol.
    #[must_use]
    pub fn new(container_port: &str, host_port: &str) -> Self {
        let port = container_port.trim();
        let normalized = if port.contains('/') {
            String::from(port)
        } else {
            format!("{port}/{DEFAULT_PORT_PROTOCOL}")
        };
        Self {
            container_port: normalized,
            host_port: String::from(host_port.trim()),
        }
    }

    /// Engine port key such as `80/tcp`.
    #[must_use]
    pub fn container_port(&self) -> &str {
        &self.container_port
    }

    /// Host port number as given by the caller.
    #[must_use]
    pub fn host_port(&self) -> &str {
        &self.host_port
    }
}

/// Host path bind-mounted into the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeBinding {
    /// Host path.
    pub source: String,
    /// Path inside the container.
    pub target: String,
}

/// Engine-enforced resource limits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceLimits {
    /// Memory ceiling in bytes.
    pub memory: Option<i64>,
    /// Relative CPU weight.
    pub cpu_shares: Option<i64>,
}

impl ResourceLimits {
    /// Parse optional memory and CPU-share strings.
    ///
    /// Blank strings count as unspecified. Returns `None` when neither limit
    /// is given.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` when either string is malformed.
    pub fn parse(
        memory: Option<&str>,
        cpu_shares: Option<&str>,
    ) -> Result<Option<Self>, DeployhookError> {
        let memory_bytes = non_blank(memory).map(parse_memory_bytes).transpose()?;
        let shares = non_blank(cpu_shares).map(parse_cpu_shares).transpose()?;

        if memory_bytes.is_none() && shares.is_none() {
            return Ok(None);
        }

        Ok(Some(Self {
            memory: memory_bytes,
            cpu_shares: shares,
        }))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.trim().is_empty())
}

/// Validated description of the container to (re)provision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    name: String,
    image: String,
    command: Option<Vec<String>>,
    limits: Option<ResourceLimits>,
    ports: Vec<PortBinding>,
    volumes: Vec<VolumeBinding>,
    environment: Option<Vec<String>>,
}

impl ContainerSpec {
    /// Create a spec with a name and image and no optional settings.
    ///
    /// # Errors
    ///
    /// Returns `RequestError::Malformed` when `name` or `image` is blank.
    pub fn new(name: &str, image: &str) -> Result<Self, DeployhookError> {
        Ok(Self {
            name: String::from(required("name", name)?),
            image: String::from(required("image", image)?),
            command: None,
            limits: None,
            ports: Vec::new(),
            volumes: Vec::new(),
            environment: None,
        })
    }

    /// Override the image command. An empty list keeps the image default.
    #[must_use]
    pub fn with_command(mut self, command: Option<Vec<String>>) -> Self {
        self.command = command.filter(|args| !args.is_empty());
        self
    }

    /// Attach resource limits.
    #[must_use]
    pub const fn with_limits(mut self, limits: Option<ResourceLimits>) -> Self {
        self.limits = limits;
        self
    }

    /// Attach port bindings.
    #[must_use]
    pub fn with_ports(mut self, ports: Vec<PortBinding>) -> Self {
        self.ports = ports;
        self
    }

    /// Attach bind mounts.
    #[must_use]
    pub fn with_volumes(mut self, volumes: Vec<VolumeBinding>) -> Self {
        self.volumes = volumes;
        self
    }

    /// Attach environment entries. An empty list is treated as absent.
    #[must_use]
    pub fn with_environment(mut self, environment: Option<Vec<String>>) -> Self {
        self.environment = environment.filter(|entries| !entries.is_empty());
        self
    }

    /// Container name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Image reference.
    #[must_use]
    pub fn image(&self) -> &str {
        &self.image
    }

    /// Command override, if any.
    #[must_use]
    pub fn command(&self) -> Option<&[String]> {
        self.command.as_deref()
    }

    /// Resource limits, if any.
    #[must_use]
    pub const fn limits(&self) -> Option<&ResourceLimits> {
        self.limits.as_ref()
    }

    /// Port bindings.
    #[must_use]
    pub fn ports(&self) -> &[PortBinding] {
        &self.ports
    }

    /// Bind mounts.
    #[must_use]
    pub fn volumes(&self) -> &[VolumeBinding] {
        &self.volumes
    }

    /// Environment entries, if any.
    #[must_use]
    pub fn environment(&self) -> Option<&[String]> {
        self.environment.as_deref()
    }
}

impl TryFrom<DeployRequest> for ContainerSpec {
    type Error = DeployhookError;

    fn try_from(request: DeployRequest) -> Result<Self, Self::Error> {
        let limits = ResourceLimits::parse(request.memory.as_deref(), request.cpu_shares.as_deref())?;
        let ports = request
            .port_bindings
            .unwrap_or_default()
            .iter()
            .map(|binding| PortBinding::new(&binding.container, &binding.host))
            .collect();
        let volumes = request
            .volume_bindings
            .unwrap_or_default()
            .into_iter()
            .map(|binding| VolumeBinding {
                source: binding.source,
                target: binding.target,
            })
            .collect();

        Ok(Self::new(&request.name, &request.image)?
            .with_command(request.custom_command)
            .with_limits(limits)
            .with_ports(ports)
            .with_volumes(volumes)
            .with_environment(request.environment))
    }
}

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, DeployhookError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DeployhookError::from(RequestError::Malformed {
            message: format!("missing required field `{field}`"),
        }));
    }
    Ok(trimmed)
}

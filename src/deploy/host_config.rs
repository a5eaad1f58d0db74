//! Translation of a [`ContainerSpec`] into `Bollard` container-create payloads.

use std::collections::HashMap;

use bollard::models::{
    ContainerCreateBody, HostConfig, Mount, MountTypeEnum, PortBinding as EnginePortBinding,
    RestartPolicy, RestartPolicyNameEnum,
};
use bollard::query_parameters::{CreateContainerOptions, CreateContainerOptionsBuilder};

use super::spec::{ContainerSpec, PortBinding, VolumeBinding};

/// Host interface every published port binds to.
const PUBLISHED_HOST_IP: &str = "0.0.0.0";

/// Create options naming the container `spec.name()`.
pub(super) fn build_create_options(spec: &ContainerSpec) -> CreateContainerOptions {
    CreateContainerOptionsBuilder::new().name(spec.name()).build()
}

/// Full create body: image, command override, environment, exposed ports,
/// and host configuration.
pub(super) fn build_create_body(spec: &ContainerSpec) -> ContainerCreateBody {
    ContainerCreateBody {
        image: Some(String::from(spec.image())),
        cmd: spec.command().map(<[String]>::to_vec),
        env: spec.environment().map(<[String]>::to_vec),
        exposed_ports: exposed_ports(spec.ports()),
        host_config: Some(build_host_config(spec)),
        ..ContainerCreateBody::default()
    }
}

pub(super) fn build_host_config(spec: &ContainerSpec) -> HostConfig {
    let limits = spec.limits();

    HostConfig {
        restart_policy: Some(RestartPolicy {
            name: Some(RestartPolicyNameEnum::ALWAYS),
            maximum_retry_count: None,
        }),
        memory: limits.and_then(|resource| resource.memory),
        cpu_shares: limits.and_then(|resource| resource.cpu_shares),
        mounts: bind_mounts(spec.volumes()),
        port_bindings: port_bindings(spec.ports()),
        ..HostConfig::default()
    }
}

fn exposed_ports(ports: &[PortBinding]) -> Option<Vec<String>> {
    if ports.is_empty() {
        return None;
    }

    let mut exposed: Vec<String> = Vec::with_capacity(ports.len());
    for port in ports {
        let container_port = String::from(port.container_port());
        if !exposed.contains(&container_port) {
            exposed.push(container_port);
        }
    }
    Some(exposed)
}

/// Group host bindings by container port; one container port may be
/// published on several host ports.
fn port_bindings(
    ports: &[PortBinding],
) -> Option<HashMap<String, Option<Vec<EnginePortBinding>>>> {
    if ports.is_empty() {
        return None;
    }

    let mut bindings: HashMap<String, Option<Vec<EnginePortBinding>>> = HashMap::new();
    for port in ports {
        let published = EnginePortBinding {
            host_ip: Some(String::from(PUBLISHED_HOST_IP)),
            host_port: Some(String::from(port.host_port())),
        };
        bindings
            .entry(String::from(port.container_port()))
            .or_insert_with(|| Some(Vec::new()))
            .get_or_insert_with(Vec::new)
            .push(published);
    }
    Some(bindings)
}

fn bind_mounts(volumes: &[VolumeBinding]) -> Option<Vec<Mount>> {
    if volumes.is_empty() {
        return None;
    }

    Some(
        volumes
            .iter()
            .map(|volume| Mount {
                source: Some(volume.source.clone()),
                target: Some(volume.target.clone()),
                typ: Some(MountTypeEnum::BIND),
                ..Mount::default()
            })
            .collect(),
    )
}

//! In-memory container engine that keeps enough state to observe redeploys.
//!
//! Shared by the behavioural test binaries through `#[path]` includes.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use bollard::auth::DockerCredentials;
use bollard::errors::Error as BollardError;
use bollard::models::{
    ContainerCreateBody, ContainerCreateResponse, ContainerInspectResponse, CreateImageInfo,
    PortBinding,
};
use bollard::query_parameters::CreateContainerOptions;
use deployhook::engine::{ContainerEngine, EngineFuture, PullProgressStream};
use futures_util::stream;

/// A container known to the fake engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FakeContainer {
    pub(crate) id: String,
    pub(crate) image: String,
    pub(crate) running: bool,
    /// Published ports as `host_ip:host_port->container_port`.
    pub(crate) published: Vec<String>,
    pub(crate) restart_policy: Option<String>,
}

#[derive(Debug, Default)]
struct Inner {
    containers: BTreeMap<String, FakeContainer>,
    pulls: Vec<(String, Option<String>)>,
    refuse_removal: bool,
    next_id: u32,
}

/// Engine double keyed by container name.
#[derive(Debug, Default)]
pub(crate) struct FakeEngine {
    inner: Mutex<Inner>,
}

fn server_error(status_code: u16, message: String) -> BollardError {
    BollardError::DockerResponseServerError {
        status_code,
        message,
    }
}

fn published_ports(bindings: HashMap<String, Option<Vec<PortBinding>>>) -> Vec<String> {
    let mut published: Vec<String> = bindings
        .into_iter()
        .flat_map(|(container_port, hosts)| {
            hosts
                .unwrap_or_default()
                .into_iter()
                .map(move |binding| {
                    format!(
                        "{}:{}->{container_port}",
                        binding.host_ip.unwrap_or_default(),
                        binding.host_port.unwrap_or_default()
                    )
                })
        })
        .collect();
    published.sort();
    published
}

impl FakeEngine {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a running container as if an earlier deploy had created it.
    pub(crate) fn seed(&self, name: &str, image: &str) {
        let mut inner = self.lock();
        inner.next_id += 1;
        let id = format!("seed{:04}", inner.next_id);
        inner.containers.insert(
            String::from(name),
            FakeContainer {
                id,
                image: String::from(image),
                running: true,
                published: Vec::new(),
                restart_policy: Some(String::from("always")),
            },
        );
    }

    /// Make every subsequent remove call fail.
    pub(crate) fn refuse_removal(&self) {
        self.lock().refuse_removal = true;
    }

    pub(crate) fn container(&self, name: &str) -> Option<FakeContainer> {
        self.lock().containers.get(name).cloned()
    }

    pub(crate) fn container_count(&self) -> usize {
        self.lock().containers.len()
    }

    /// Images pulled so far, with the username each pull authenticated as.
    pub(crate) fn pulls(&self) -> Vec<(String, Option<String>)> {
        self.lock().pulls.clone()
    }
}

impl ContainerEngine for FakeEngine {
    fn ping(&self) -> EngineFuture<'_, ()> {
        Box::pin(async { Ok(()) })
    }

    fn pull_image(
        &self,
        image: &str,
        credentials: Option<DockerCredentials>,
    ) -> PullProgressStream<'_> {
        let username = credentials.and_then(|auth| auth.username);
        self.lock().pulls.push((String::from(image), username));
        let progress: Vec<Result<CreateImageInfo, BollardError>> = vec![Ok(CreateImageInfo {
            status: Some(format!("Status: Downloaded newer image for {image}")),
            ..CreateImageInfo::default()
        })];
        Box::pin(stream::iter(progress))
    }

    fn inspect_container(&self, name: &str) -> EngineFuture<'_, Option<ContainerInspectResponse>> {
        let found = self.container(name).map(|container| ContainerInspectResponse {
            id: Some(container.id),
            name: Some(format!("/{name}")),
            image: Some(container.image),
            ..ContainerInspectResponse::default()
        });
        Box::pin(async move { Ok(found) })
    }

    fn stop_container(&self, name: &str) -> EngineFuture<'_, ()> {
        let result = match self.lock().containers.get_mut(name) {
            Some(container) => {
                container.running = false;
                Ok(())
            }
            None => Err(server_error(404, format!("No such container: {name}"))),
        };
        Box::pin(async move { result })
    }

    fn remove_container(&self, name: &str) -> EngineFuture<'_, ()> {
        let mut inner = self.lock();
        let result = if inner.refuse_removal {
            Err(server_error(500, format!("could not remove container {name}")))
        } else if inner.containers.remove(name).is_some() {
            Ok(())
        } else {
            Err(server_error(404, format!("No such container: {name}")))
        };
        Box::pin(async move { result })
    }

    fn create_container(
        &self,
        options: CreateContainerOptions,
        body: ContainerCreateBody,
    ) -> EngineFuture<'_, ContainerCreateResponse> {
        let name = options.name.unwrap_or_default();
        let mut inner = self.lock();
        let result = if inner.containers.contains_key(&name) {
            Err(server_error(
                409,
                format!("Conflict. The container name \"/{name}\" is already in use"),
            ))
        } else {
            inner.next_id += 1;
            let id = format!("ctr{:04}", inner.next_id);
            let host_config = body.host_config.unwrap_or_default();
            inner.containers.insert(
                name,
                FakeContainer {
                    id: id.clone(),
                    image: body.image.unwrap_or_default(),
                    running: false,
                    published: published_ports(host_config.port_bindings.unwrap_or_default()),
                    restart_policy: host_config
                        .restart_policy
                        .and_then(|policy| policy.name)
                        .map(|name| name.to_string()),
                },
            );
            Ok(ContainerCreateResponse {
                id,
                ..ContainerCreateResponse::default()
            })
        };
        Box::pin(async move { result })
    }

    fn start_container(&self, container_id: &str) -> EngineFuture<'_, ()> {
        let mut inner = self.lock();
        let result = match inner
            .containers
            .values_mut()
            .find(|container| container.id == container_id)
        {
            Some(container) => {
                container.running = true;
                Ok(())
            }
            None => Err(server_error(404, format!("No such container: {container_id}"))),
        };
        Box::pin(async move { result })
    }
}

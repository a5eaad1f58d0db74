//! Container engine connection and lifecycle calls.
//!
//! The engine endpoint is resolved through a priority-based fallback chain:
//!
//! 1. CLI argument (`--engine-socket`)
//! 2. Config file (`engine_socket` in TOML)
//! 3. `DEPLOYHOOK_ENGINE_SOCKET` environment variable
//! 4. `DOCKER_HOST`, then `CONTAINER_HOST`, then `PODMAN_HOST`
//! 5. Platform default (`/var/run/docker.sock` on Unix)

mod connection;
mod lifecycle;

#[cfg(test)]
pub(crate) mod test_support;

pub use connection::{EngineConnector, SocketResolver};
pub use lifecycle::{ContainerEngine, EngineFuture, PullProgressStream, is_not_found};

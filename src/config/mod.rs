//! Configuration system for deployhook.
//!
//! Configuration loading and precedence merging is handled by the
//! `ortho_config` crate: CLI flags override environment variables, which
//! override configuration files, which override defaults.
//!
//! # Example Configuration
//!
//! ```toml
//! engine_socket = "unix:///var/run/docker.sock"
//! listen = "0.0.0.0:4444"
//!
//! [registry]
//! host = "d.puneet.cc"
//! docker_config_dir = "/root/.docker"
//!
//! [auth]
//! api_key = "change-me"
//! ```

mod cli;
mod loader;
mod types;

#[cfg(test)]
mod tests;

pub use cli::{Cli, Commands, DeployArgs};
pub use loader::{env_var_names, load_config};
pub use types::{
    AppConfig, AuthConfig, DEFAULT_LISTEN, DEFAULT_REGISTRY_HOST, RegistryConfig,
};

//! Configuration data types for deployhook.

use std::fmt;
use std::net::SocketAddr;

use camino::Utf8PathBuf;
use ortho_config::{OrthoConfig, OrthoResult, PostMergeContext, PostMergeHook};
use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;

use crate::error::{ConfigError, Result};

/// Registry images must come from when no host is configured.
pub const DEFAULT_REGISTRY_HOST: &str = "d.puneet.cc";

/// Address the webhook listens on when none is configured.
pub const DEFAULT_LISTEN: &str = "0.0.0.0:4444";

/// Private registry configuration.
#[derive(Debug, Clone, PartialEq, Eq, SmartDefault, Deserialize, Serialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Hostname every deployed image must be prefixed with.
    #[default(String::from(DEFAULT_REGISTRY_HOST))]
    pub host: String,

    /// Docker client configuration directory holding `config.json`.
    ///
    /// Falls back to `$DOCKER_CONFIG`, then `~/.docker`.
    pub docker_config_dir: Option<Utf8PathBuf>,
}

/// Request authorisation configuration.
#[derive(Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared secret expected in the `x-api-key` header. Unset disables
    /// authorisation.
    pub api_key: Option<String>,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Root application configuration.
///
/// Loaded from defaults, a configuration file, environment variables, and
/// command-line arguments, in increasing order of precedence.
///
/// Configuration files are discovered in this order:
/// 1. Path specified via `DEPLOYHOOK_CONFIG_PATH`
/// 2. `.deployhook.toml` in the current working directory
/// 3. `.deployhook.toml` in the home directory
/// 4. `~/.config/deployhook/config.toml`
#[derive(Debug, Clone, PartialEq, Eq, SmartDefault, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(
    prefix = "DEPLOYHOOK",
    post_merge_hook,
    discovery(
        app_name = "deployhook",
        env_var = "DEPLOYHOOK_CONFIG_PATH",
        config_file_name = "config.toml",
        dotfile_name = ".deployhook.toml",
        config_cli_long = "config",
        config_cli_visible = true,
    )
)]
pub struct AppConfig {
    /// The container engine socket path or URL.
    pub engine_socket: Option<String>,

    /// Socket address the HTTP server binds.
    #[default(String::from(DEFAULT_LISTEN))]
    #[serde(default = "default_listen")]
    #[ortho_config(skip_cli)]
    pub listen: String,

    /// Private registry configuration.
    #[serde(default)]
    #[ortho_config(skip_cli)]
    pub registry: RegistryConfig,

    /// Request authorisation configuration.
    #[serde(default)]
    #[ortho_config(skip_cli)]
    pub auth: AuthConfig,
}

fn default_listen() -> String {
    String::from(DEFAULT_LISTEN)
}

impl AppConfig {
    /// Check values the type system cannot.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` when `registry.host` is blank or
    /// `listen` is not a socket address.
    pub fn validate(&self) -> Result<()> {
        if self.registry.host.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: String::from("registry.host"),
                reason: String::from("cannot be empty"),
            }
            .into());
        }
        self.listen_addr().map(|_| ())
    }

    /// The parsed `listen` address.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` when `listen` does not parse.
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse::<SocketAddr>().map_err(|error| {
            ConfigError::InvalidValue {
                field: String::from("listen"),
                reason: format!("'{}' is not a socket address: {error}", self.listen),
            }
            .into()
        })
    }
}

impl PostMergeHook for AppConfig {
    fn post_merge(&mut self, _ctx: &PostMergeContext) -> OrthoResult<()> {
        // Accept `https://d.puneet.cc/` style hosts by reducing them to the
        // bare hostname images are prefixed with.
        let host = self.registry.host.trim();
        let without_scheme = host
            .strip_prefix("https://")
            .or_else(|| host.strip_prefix("http://"))
            .unwrap_or(host);
        self.registry.host = String::from(without_scheme.trim_end_matches('/'));
        self.listen = String::from(self.listen.trim());
        if self
            .auth
            .api_key
            .as_deref()
            .is_some_and(|key| key.trim().is_empty())
        {
            self.auth.api_key = None;
        }
        Ok(())
    }
}

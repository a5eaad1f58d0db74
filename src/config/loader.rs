//! Configuration loading with layered precedence.
//!
//! Precedence (lowest to highest): application defaults, configuration file,
//! environment variables, command-line arguments.
//!
//! Layers are composed with `MergeComposer` directly rather than through the
//! derived `load()` because the `Cli` struct owns subcommand dispatch and
//! `--config` discovery, and because environment variables are mapped
//! through an explicit table that also covers the legacy
//! `DOCKER_DEPLOY_SECRET` name.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use ortho_config::discovery::ConfigDiscovery;
use ortho_config::serde_json::{self, Map, Value};
use ortho_config::{MergeComposer, toml};

use crate::config::{AppConfig, Cli};
use crate::error::{ConfigError, Result};

/// Mapping from one environment variable to a configuration path.
struct EnvVarSpec {
    /// The environment variable name (e.g., `DEPLOYHOOK_ENGINE_SOCKET`).
    env_var: &'static str,
    /// The JSON path segments (e.g., `["registry", "host"]`).
    path: &'static [&'static str],
}

/// Environment variables recognised by the loader, applied in order.
///
/// Legacy names come first so the prefixed variable wins when both are set.
const ENV_VAR_SPECS: &[EnvVarSpec] = &[
    EnvVarSpec {
        env_var: "DOCKER_DEPLOY_SECRET",
        path: &["auth", "api_key"],
    },
    EnvVarSpec {
        env_var: "DEPLOYHOOK_ENGINE_SOCKET",
        path: &["engine_socket"],
    },
    EnvVarSpec {
        env_var: "DEPLOYHOOK_LISTEN",
        path: &["listen"],
    },
    EnvVarSpec {
        env_var: "DEPLOYHOOK_REGISTRY_HOST",
        path: &["registry", "host"],
    },
    EnvVarSpec {
        env_var: "DEPLOYHOOK_REGISTRY_DOCKER_CONFIG_DIR",
        path: &["registry", "docker_config_dir"],
    },
    EnvVarSpec {
        env_var: "DEPLOYHOOK_AUTH_API_KEY",
        path: &["auth", "api_key"],
    },
];

/// Returns the environment variable names recognised by the config loader.
///
/// Tests use this to clear every variable that could leak into a load.
#[must_use]
pub fn env_var_names() -> Vec<&'static str> {
    ENV_VAR_SPECS.iter().map(|spec| spec.env_var).collect()
}

/// Read a TOML configuration file and push it to the composer.
fn load_config_file(path: &Utf8PathBuf, composer: &mut MergeComposer) -> Result<()> {
    let parent = path
        .parent()
        .filter(|dir| !dir.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let file_name = path.file_name().unwrap_or(path.as_str());

    let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(|e| {
        ConfigError::ParseError {
            message: format!("failed to open directory {parent}: {e}"),
        }
    })?;

    let content = dir
        .read_to_string(file_name)
        .map_err(|e| ConfigError::ParseError {
            message: format!("failed to read {path}: {e}"),
        })?;

    let value =
        toml::from_str::<serde_json::Value>(&content).map_err(|e| ConfigError::ParseError {
            message: format!("failed to parse {path}: {e}"),
        })?;

    composer.push_file(value, Some(path.clone()));
    Ok(())
}

/// Locate the configuration file: `--config` when it exists, otherwise
/// `DEPLOYHOOK_CONFIG_PATH`, `.deployhook.toml`, then
/// `~/.config/deployhook/config.toml`.
fn discover_config_path(cli: &Cli) -> Option<Utf8PathBuf> {
    cli.config.clone().filter(|p| p.exists()).or_else(|| {
        let discovery = ConfigDiscovery::builder("deployhook")
            .env_var("DEPLOYHOOK_CONFIG_PATH")
            .config_file_name("config.toml")
            .dotfile_name(".deployhook.toml")
            .build();
        discovery
            .candidates()
            .into_iter()
            .filter(|p| p.exists())
            .find_map(|p| Utf8PathBuf::try_from(p).ok())
    })
}

/// Load configuration with full layer precedence.
///
/// # Errors
///
/// Returns `ConfigError` if a configuration file is malformed, the layers do
/// not merge into an [`AppConfig`], or the merged values fail validation.
pub fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut composer = MergeComposer::new();

    let defaults =
        serde_json::to_value(AppConfig::default()).map_err(|e| ConfigError::ParseError {
            message: format!("failed to serialise defaults: {e}"),
        })?;
    composer.push_defaults(defaults);

    if let Some(ref path) = discover_config_path(cli) {
        load_config_file(path, &mut composer)?;
    }

    let env_values = collect_env_vars(|name| std::env::var(name).ok());
    if !env_values.is_null() {
        composer.push_environment(env_values);
    }

    let cli_overrides = build_cli_overrides(cli);
    if !cli_overrides.is_null() {
        composer.push_cli(cli_overrides);
    }

    let config =
        AppConfig::merge_from_layers(composer.layers()).map_err(ConfigError::OrthoConfig)?;
    config.validate()?;
    Ok(config)
}

/// Collect the variables in [`ENV_VAR_SPECS`] into a nested JSON value.
///
/// Returns `Value::Null` when none are set.
fn collect_env_vars(lookup: impl Fn(&str) -> Option<String>) -> Value {
    let mut root = Map::new();

    for spec in ENV_VAR_SPECS {
        let Some(raw_value) = lookup(spec.env_var) else {
            continue;
        };
        insert_at_path(&mut root, spec.path, Value::String(raw_value));
    }

    if root.is_empty() {
        Value::Null
    } else {
        Value::Object(root)
    }
}

/// Insert a value at a nested path, creating intermediate objects.
fn insert_at_path(root: &mut Map<String, Value>, path: &[&str], value: Value) {
    let Some((&field, parents)) = path.split_last() else {
        return;
    };

    let mut current = root;
    for &segment in parents {
        let entry = current
            .entry(String::from(segment))
            .or_insert_with(|| Value::Object(Map::new()));
        let Some(obj) = entry.as_object_mut() else {
            return;
        };
        current = obj;
    }

    current.insert(String::from(field), value);
}

/// Build a JSON value containing CLI overrides.
fn build_cli_overrides(cli: &Cli) -> Value {
    let mut root = Map::new();

    if let Some(ref socket) = cli.engine_socket {
        insert_at_path(&mut root, &["engine_socket"], Value::String(socket.clone()));
    }
    if let Some(ref listen) = cli.listen {
        insert_at_path(&mut root, &["listen"], Value::String(listen.clone()));
    }
    if let Some(ref registry) = cli.registry {
        insert_at_path(&mut root, &["registry", "host"], Value::String(registry.clone()));
    }

    if root.is_empty() {
        Value::Null
    } else {
        Value::Object(root)
    }
}

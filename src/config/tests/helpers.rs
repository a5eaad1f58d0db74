//! Shared fixtures and helper functions for config tests.

use std::sync::Arc;

use ortho_config::MergeComposer;
use ortho_config::serde_json::json;
use rstest::fixture;

use crate::config::AppConfig;

/// Fixture providing an `AppConfig` parsed from a full TOML example.
#[fixture]
pub fn app_config_from_full_toml() -> AppConfig {
    let toml = r#"
        engine_socket = "unix:///run/podman/podman.sock"
        listen = "127.0.0.1:8080"

        [registry]
        host = "registry.internal"
        docker_config_dir = "/srv/deploy/.docker"

        [auth]
        api_key = "s3cret"
    "#;

    toml::from_str(toml).expect("TOML parsing should succeed")
}

/// Fixture providing an `AppConfig` parsed from a minimal TOML example.
#[fixture]
pub fn app_config_from_partial_toml() -> AppConfig {
    let toml = r#"
        engine_socket = "unix:///tmp/docker.sock"
    "#;

    toml::from_str(toml).expect("TOML parsing should succeed")
}

/// Creates a `MergeComposer` with the serialised defaults layer pushed.
pub fn create_composer_with_defaults() -> Result<MergeComposer, serde_json::Error> {
    let mut composer = MergeComposer::new();
    let defaults = ortho_config::serde_json::to_value(AppConfig::default())?;
    composer.push_defaults(defaults);
    Ok(composer)
}

/// Creates a composer with defaults plus a standard file and environment
/// layer.
pub fn create_composer_with_file_and_env() -> Result<MergeComposer, serde_json::Error> {
    let mut composer = create_composer_with_defaults()?;
    composer.push_file(
        json!({
            "engine_socket": "unix:///from/file.sock",
            "listen": "127.0.0.1:7000",
            "registry": { "host": "file.registry" }
        }),
        None,
    );
    composer.push_environment(json!({
        "engine_socket": "unix:///from/env.sock"
    }));
    Ok(composer)
}

/// Merges the layers of a composer into `AppConfig`.
pub fn merge_config(composer: MergeComposer) -> Result<AppConfig, Arc<ortho_config::OrthoError>> {
    AppConfig::merge_from_layers(composer.layers())
}

/// Asserts that a config has all default values.
pub fn assert_config_has_defaults(config: &AppConfig) {
    assert!(config.engine_socket.is_none(), "engine_socket should be None");
    assert_eq!(config.listen, "0.0.0.0:4444", "listen should default");
    assert_eq!(config.registry.host, "d.puneet.cc", "registry.host should default");
    assert!(
        config.registry.docker_config_dir.is_none(),
        "registry.docker_config_dir should be None"
    );
    assert!(config.auth.api_key.is_none(), "auth.api_key should be None");
}

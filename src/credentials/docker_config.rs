//! Parsing of the Docker client `config.json` and the lookup rules the Docker
//! CLI applies to it.

use std::collections::HashMap;
use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use bollard::auth::DockerCredentials;
use serde::Deserialize;

use crate::error::CredentialError;

/// The subset of `config.json` relevant to registry authentication.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct DockerConfigFile {
    #[serde(default)]
    auths: HashMap<String, AuthEntry>,
    #[serde(default)]
    creds_store: Option<String>,
    #[serde(default)]
    cred_helpers: HashMap<String, String>,
}

/// One entry of the `auths` table.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
pub(super) struct AuthEntry {
    #[serde(default)]
    auth: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    identitytoken: Option<String>,
    #[serde(default)]
    registrytoken: Option<String>,
}

/// Where credentials for a registry come from.
#[derive(Debug, PartialEq, Eq)]
pub(super) enum CredentialSource<'a> {
    /// Ask `docker-credential-<name>`.
    Helper(&'a str),
    /// Use an inline `auths` entry.
    Stored(&'a AuthEntry),
    /// Nothing configured; pull anonymously.
    Anonymous,
}

impl DockerConfigFile {
    /// Parse `content` read from `path`.
    pub(super) fn parse(content: &str, path: &Path) -> Result<Self, CredentialError> {
        serde_json::from_str(content).map_err(|error| CredentialError::ConfigMalformed {
            path: path.to_path_buf(),
            message: error.to_string(),
        })
    }

    /// Pick the credential source for `registry`: a per-registry helper,
    /// then the default store, then an inline `auths` entry.
    pub(super) fn source_for(&self, registry: &str) -> CredentialSource<'_> {
        if let Some(helper) = non_empty(self.cred_helpers.get(registry)) {
            return CredentialSource::Helper(helper);
        }
        if let Some(store) = non_empty(self.creds_store.as_ref()) {
            return CredentialSource::Helper(store);
        }

        self.auths
            .iter()
            .find(|(key, _)| normalize_registry_key(key) == registry)
            .map_or(CredentialSource::Anonymous, |(_, entry)| {
                CredentialSource::Stored(entry)
            })
    }
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|name| !name.trim().is_empty())
}

/// Reduce an `auths` key such as `https://d.puneet.cc/v1/` to its hostname.
pub(super) fn normalize_registry_key(key: &str) -> &str {
    let without_scheme = key
        .strip_prefix("https://")
        .or_else(|| key.strip_prefix("http://"))
        .unwrap_or(key);
    without_scheme
        .split_once('/')
        .map_or(without_scheme, |(host, _)| host)
}

impl AuthEntry {
    /// Convert the entry into engine credentials for `registry`.
    ///
    /// A non-empty `auth` field wins over explicit `username`/`password`.
    pub(super) fn to_credentials(
        &self,
        registry: &str,
    ) -> Result<DockerCredentials, CredentialError> {
        let (username, password) = match non_empty(self.auth.as_ref()) {
            Some(encoded) => {
                let (user, secret) = decode_basic_auth(encoded, registry)?;
                (Some(user), Some(secret))
            }
            None => (self.username.clone(), self.password.clone()),
        };

        Ok(DockerCredentials {
            username,
            password,
            email: self.email.clone(),
            serveraddress: Some(String::from(registry)),
            identitytoken: self.identitytoken.clone(),
            registrytoken: self.registrytoken.clone(),
            ..DockerCredentials::default()
        })
    }
}

fn decode_basic_auth(encoded: &str, registry: &str) -> Result<(String, String), CredentialError> {
    let invalid = |message: String| CredentialError::InvalidAuth {
        registry: String::from(registry),
        message,
    };

    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|error| invalid(format!("auth is not valid base64: {error}")))?;
    let decoded =
        String::from_utf8(bytes).map_err(|_| invalid(String::from("auth is not valid UTF-8")))?;
    decoded
        .split_once(':')
        .map(|(user, secret)| (String::from(user), String::from(secret)))
        .ok_or_else(|| invalid(String::from("auth must decode to 'username:password'")))
}

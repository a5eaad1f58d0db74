//! Registry credential resolution.
//!
//! Credentials are read the way the Docker CLI reads them: from
//! `config.json` in the Docker configuration directory, consulting
//! credential helpers (`credHelpers`, `credsStore`) before inline `auths`
//! entries. A registry with nothing configured resolves to `None` and the
//! image is pulled anonymously.

mod docker_config;
mod helper;

#[cfg(test)]
pub(crate) mod test_support;

use std::future::Future;
use std::io::ErrorKind;
use std::pin::Pin;

use bollard::auth::DockerCredentials;
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;

use crate::error::CredentialError;
use docker_config::{CredentialSource, DockerConfigFile};

/// File name of the Docker client configuration.
const CONFIG_FILE_NAME: &str = "config.json";

/// Boxed future type returned by [`CredentialStore`] implementors.
pub type CredentialFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Option<DockerCredentials>, CredentialError>> + Send + 'a>>;

/// Source of registry credentials.
pub trait CredentialStore: Send + Sync {
    /// Resolve credentials for the registry `registry` (a hostname, optionally
    /// with a port). `None` means pull anonymously.
    fn resolve(&self, registry: &str) -> CredentialFuture<'_>;
}

/// Credentials from a Docker client configuration directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockerConfigStore {
    config_dir: Option<Utf8PathBuf>,
}

impl DockerConfigStore {
    /// Store reading `config.json` from `config_dir`.
    #[must_use]
    pub const fn new(config_dir: Utf8PathBuf) -> Self {
        Self {
            config_dir: Some(config_dir),
        }
    }

    /// Locate the configuration directory: `configured`, else
    /// `$DOCKER_CONFIG`, else `$HOME/.docker`.
    ///
    /// When none of these is available every registry resolves anonymously.
    #[must_use]
    pub fn locate<E: mockable::Env>(configured: Option<&Utf8Path>, env: &E) -> Self {
        let non_blank = |value: &String| !value.trim().is_empty();
        let config_dir = configured
            .filter(|path| !path.as_str().is_empty())
            .map(Utf8Path::to_path_buf)
            .or_else(|| {
                env.string("DOCKER_CONFIG")
                    .filter(non_blank)
                    .map(Utf8PathBuf::from)
            })
            .or_else(|| {
                env.string("HOME")
                    .filter(non_blank)
                    .map(|home| Utf8PathBuf::from(home).join(".docker"))
            });
        Self { config_dir }
    }

    /// Directory the store reads from, if one was located.
    #[must_use]
    pub fn config_dir(&self) -> Option<&Utf8Path> {
        self.config_dir.as_deref()
    }

    /// Read and parse `config.json`; `None` when the directory or file does
    /// not exist.
    fn read_config(&self) -> Result<Option<DockerConfigFile>, CredentialError> {
        let Some(dir_path) = self.config_dir.as_deref() else {
            return Ok(None);
        };
        let file_path = dir_path.join(CONFIG_FILE_NAME);
        let unreadable = |error: std::io::Error| CredentialError::ConfigUnreadable {
            path: file_path.clone().into(),
            message: error.to_string(),
        };

        let dir = match Dir::open_ambient_dir(dir_path, ambient_authority()) {
            Ok(dir) => dir,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(unreadable(error)),
        };
        let content = match dir.read_to_string(CONFIG_FILE_NAME) {
            Ok(content) => content,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(unreadable(error)),
        };

        DockerConfigFile::parse(&content, file_path.as_std_path()).map(Some)
    }
}

impl CredentialStore for DockerConfigStore {
    fn resolve(&self, registry: &str) -> CredentialFuture<'_> {
        let host = String::from(registry);
        Box::pin(async move {
            let Some(config) = self.read_config()? else {
                tracing::debug!(registry = %host, "no docker config found; pulling anonymously");
                return Ok(None);
            };

            match config.source_for(&host) {
                CredentialSource::Helper(name) => {
                    tracing::debug!(registry = %host, helper = name, "using credential helper");
                    helper::fetch(name, &host).await
                }
                CredentialSource::Stored(entry) => {
                    tracing::debug!(registry = %host, "using stored registry auth");
                    entry.to_credentials(&host).map(Some)
                }
                CredentialSource::Anonymous => {
                    tracing::debug!(registry = %host, "no credentials configured for registry");
                    Ok(None)
                }
            }
        })
    }
}

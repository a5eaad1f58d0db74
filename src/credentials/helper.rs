//! Docker credential-helper protocol (`docker-credential-<name> get`).

use std::process::Stdio;

use bollard::auth::DockerCredentials;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::CredentialError;

/// Username a helper reports when `Secret` is an identity token.
const IDENTITY_TOKEN_USERNAME: &str = "<token>";

/// Message helpers print when they hold nothing for the registry.
const NOT_FOUND_MESSAGE: &str = "credentials not found";

#[derive(Debug, Deserialize)]
struct HelperResponse {
    #[serde(rename = "ServerURL", default)]
    server_url: Option<String>,
    #[serde(rename = "Username", default)]
    username: String,
    #[serde(rename = "Secret", default)]
    secret: String,
}

/// Query `docker-credential-<helper>` for `registry`.
pub(super) async fn fetch(
    helper: &str,
    registry: &str,
) -> Result<Option<DockerCredentials>, CredentialError> {
    let mut command = Command::new(format!("docker-credential-{helper}"));
    command.arg("get");
    run(helper, command, registry).await
}

/// Run a prepared helper command, writing `registry` to its stdin.
async fn run(
    helper: &str,
    mut command: Command,
    registry: &str,
) -> Result<Option<DockerCredentials>, CredentialError> {
    let failed = |message: String| CredentialError::HelperFailed {
        helper: String::from(helper),
        message,
    };

    let mut child = command
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|error| failed(format!("failed to launch: {error}")))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(registry.as_bytes())
            .await
            .map_err(|error| failed(format!("failed to write request: {error}")))?;
    }

    let output = child
        .wait_with_output()
        .await
        .map_err(|error| failed(format!("failed to read response: {error}")))?;

    if !output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = format!("{}{}", stdout.trim(), stderr.trim());
        if detail.to_lowercase().contains(NOT_FOUND_MESSAGE) {
            tracing::debug!(helper, registry, "credential helper has no entry");
            return Ok(None);
        }
        return Err(failed(format!("exited with {}: {detail}", output.status)));
    }

    let response: HelperResponse = serde_json::from_slice(&output.stdout)
        .map_err(|error| failed(format!("unparseable response: {error}")))?;
    Ok(Some(into_credentials(response, registry)))
}

fn into_credentials(response: HelperResponse, registry: &str) -> DockerCredentials {
    let serveraddress = response
        .server_url
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| String::from(registry));

    if response.username == IDENTITY_TOKEN_USERNAME {
        return DockerCredentials {
            identitytoken: Some(response.secret),
            serveraddress: Some(serveraddress),
            ..DockerCredentials::default()
        };
    }

    DockerCredentials {
        username: Some(response.username),
        password: Some(response.secret),
        serveraddress: Some(serveraddress),
        ..DockerCredentials::default()
    }
}

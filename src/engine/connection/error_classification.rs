//! Maps `Bollard` connection failures onto [`ContainerError`] variants.

use std::io::ErrorKind;
use std::path::Path;

use crate::error::ContainerError;

/// Strip `unix://` or `npipe://` to get the filesystem path of a socket URI.
///
/// HTTP endpoints have no filesystem path and yield `None`.
pub(super) fn extract_socket_path(socket_uri: &str) -> Option<&Path> {
    socket_uri
        .strip_prefix("unix://")
        .or_else(|| socket_uri.strip_prefix("npipe://"))
        .map(Path::new)
}

fn classify_io_error_kind(
    kind: ErrorKind,
    socket_path: Option<&Path>,
    message: String,
) -> ContainerError {
    match (kind, socket_path) {
        (ErrorKind::PermissionDenied, Some(path)) => ContainerError::PermissionDenied {
            path: path.to_path_buf(),
        },
        (ErrorKind::NotFound, Some(path)) => ContainerError::SocketNotFound {
            path: path.to_path_buf(),
        },
        _ => ContainerError::ConnectionFailed { message },
    }
}

/// Classify a `Bollard` connection error for the endpoint `socket_uri`.
///
/// Falls back to `ConnectionFailed` for errors without a recognisable I/O
/// cause or for endpoints without filesystem paths.
pub(super) fn classify_connection_error(
    bollard_error: &bollard::errors::Error,
    socket_uri: &str,
) -> ContainerError {
    let socket_path = extract_socket_path(socket_uri);
    let message = bollard_error.to_string();

    match bollard_error {
        bollard::errors::Error::SocketNotFoundError(_) => {
            if let Some(path) = socket_path {
                return ContainerError::SocketNotFound {
                    path: path.to_path_buf(),
                };
            }
        }
        bollard::errors::Error::IOError { err } => {
            let kind = io_error_kind_in_chain(err).unwrap_or_else(|| err.kind());
            return classify_io_error_kind(kind, socket_path, message);
        }
        _ => {}
    }

    match io_error_kind_in_chain(bollard_error) {
        Some(kind) => classify_io_error_kind(kind, socket_path, message),
        None => ContainerError::ConnectionFailed { message },
    }
}

/// Walk the error source chain looking for an `io::Error` kind.
fn io_error_kind_in_chain(error: &dyn std::error::Error) -> Option<ErrorKind> {
    let mut current: Option<&(dyn std::error::Error + 'static)> = error.source();
    while let Some(err) = current {
        if let Some(io_err) = err.downcast_ref::<std::io::Error>() {
            return Some(io_err.kind());
        }
        current = err.source();
    }
    None
}

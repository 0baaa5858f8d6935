//! Error utilities

use crate::client::ApiResponse;
use thiserror::Error;

/// Errors returned by [`ApplyClient`](crate::client::ApplyClient).
///
/// HTTP statuses are not errors: any response except `409` on create is
/// returned to the caller as [`ApiResponse`].
#[derive(Debug, Error)]
pub enum ApplyError {
    /// Network, TLS or DNS failure, passed through as is
    #[error(transparent)]
    Transport(#[from] kube::Error),
    /// Object already exists, but fetching it failed
    #[error("cannot get existing object: {status}\n{body}")]
    ConflictResolution { status: u16, body: String },
    /// Response body is not valid JSON
    #[error("failed to parse response body")]
    Parse(#[source] serde_json::Error),
    #[error("failed to serialize request body")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to build request")]
    Request(#[from] http::Error),
    #[error("invalid cluster url '{0}'")]
    InvalidUrl(String),
    #[error("failed to create http client")]
    Connect(#[source] kube::Error),
    #[error("resource has no metadata.namespace")]
    MissingNamespace,
    #[error("resource has no metadata.name")]
    MissingName,
}

/// Describes error reason
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    NotFound,
    Conflict,
    AlreadyExists,
    /// Catch-all variant. Since this enum is non-exhaustive,
    /// it should be handled with `_` pattern
    Unknown,
}

/// Tries to classify k8s error by `Status.reason`
pub fn classify(error_reason: &str) -> ErrorClass {
    match error_reason {
        "NotFound" => ErrorClass::NotFound,
        "Conflict" => ErrorClass::Conflict,
        "AlreadyExists" => ErrorClass::AlreadyExists,
        _ => ErrorClass::Unknown,
    }
}

/// Tries to classify k8s error by HTTP status code
pub fn classify_status(status_code: u16) -> ErrorClass {
    match status_code {
        404 => ErrorClass::NotFound,
        409 => ErrorClass::Conflict,
        _ => ErrorClass::Unknown,
    }
}

/// Tries to classify unsuccessful response. `reason` of the returned
/// `Status` object takes precedence over the status code.
pub fn classify_response(response: &ApiResponse) -> ErrorClass {
    if response.is_success() {
        return ErrorClass::Unknown;
    }
    let by_reason = response
        .data
        .get("reason")
        .and_then(|r| r.as_str())
        .map(classify);
    match by_reason {
        Some(ErrorClass::Unknown) | None => classify_status(response.status_code),
        Some(class) => class,
    }
}

//! Shared HTTP plumbing: client construction and error mapping.

use std::time::Duration;

use csdk_release_core::ProviderError;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;

pub(crate) const USER_AGENT: &str = concat!("csdk-release-verify/", env!("CARGO_PKG_VERSION"));

pub(crate) fn build_client(timeout: Duration, verify_tls: bool) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .danger_accept_invalid_certs(!verify_tls)
        .build()
        .map_err(|e| ProviderError::Request(format!("cannot build HTTP client: {e}")))
}

/// Map a transport error. Connection failures mean the host is unreachable.
pub(crate) fn transport_error(system: &str, err: reqwest::Error, timeout: Duration) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout(timeout)
    } else if err.is_connect() {
        ProviderError::Unavailable {
            system: system.to_string(),
            detail: err.without_url().to_string(),
        }
    } else {
        ProviderError::Request(err.without_url().to_string())
    }
}

/// Map a non-success status for `what`.
pub(crate) fn status_error(what: &str, status: StatusCode) -> ProviderError {
    match status {
        StatusCode::NOT_FOUND => ProviderError::NotFound(what.to_string()),
        _ => ProviderError::Request(format!("HTTP {status} for {what}")),
    }
}

/// Check the status and decode a JSON body.
pub(crate) async fn decode<T: DeserializeOwned>(what: &str, response: Response) -> Result<T, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        return Err(status_error(what, status));
    }
    response
        .json::<T>()
        .await
        .map_err(|e| ProviderError::Malformed(format!("{what}: {}", e.without_url())))
}

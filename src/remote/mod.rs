//! HTTP access to the store backends
//!
//! All calls are blocking. Tokens are minted per lane run and never logged.

pub mod app_store;
pub mod google;
pub mod play;

pub use app_store::AppStoreToken;
pub use google::GoogleAuth;
pub use play::PlayEdits;

use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error::{DeployError, Result};

/// Build the shared blocking client
pub fn http_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("mobile-deploy/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| DeployError::remote(format!("Cannot create HTTP client: {}", e)))
}

/// Turn a non-success status into a remote error carrying the response body
pub(crate) fn check_status(response: Response, context: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    Err(DeployError::remote(format!(
        "{} returned {}: {}",
        context,
        status,
        body.trim()
    )))
}

/// Check the status and decode a JSON body
pub(crate) fn read_json<T: DeserializeOwned>(response: Response, context: &str) -> Result<T> {
    check_status(response, context)?
        .json::<T>()
        .map_err(|e| {
            DeployError::remote(format!(
                "{} returned an unexpected body: {}",
                context,
                e.without_url()
            ))
        })
}

/// Transport failure, with the URL stripped since it may embed a secret
pub(crate) fn send_error(context: &str, err: reqwest::Error) -> DeployError {
    DeployError::remote(format!("{} request failed: {}", context, err.without_url()))
}

//! Latest-release lookup.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::{CheckError, Result};

const SERVICE: &str = "version check";

/// Default endpoint publishing the latest release.
pub const DEFAULT_VERSION_CHECK_URL: &str = "https://versioncheck.linkerd.io/version.json";

/// Source of the latest published release version.
#[async_trait]
pub trait VersionLookup: Send + Sync {
    /// Fetch the latest release version string.
    async fn latest_version(&self) -> Result<String>;
}

#[derive(Deserialize)]
struct VersionResponse {
    version: Option<String>,
}

/// Fetches `{"version": "..."}` from an HTTP endpoint.
pub struct HttpVersionLookup {
    url: String,
    current_version: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpVersionLookup {
    pub fn new(
        url: impl Into<String>,
        current_version: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            url: url.into(),
            current_version: current_version.into(),
            timeout,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl VersionLookup for HttpVersionLookup {
    async fn latest_version(&self) -> Result<String> {
        debug!(url = %self.url, "fetching latest version");

        let rsp = self
            .client
            .get(&self.url)
            .query(&[("version", self.current_version.as_str()), ("source", "cli")])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| CheckError::from_transport(&self.url, self.timeout, e))?;

        if rsp.status() != http::StatusCode::OK {
            return Err(CheckError::unexpected_status(SERVICE, rsp.status()));
        }

        let bytes = rsp
            .bytes()
            .await
            .map_err(|e| CheckError::from_transport(&self.url, self.timeout, e))?;
        let body: VersionResponse =
            serde_json::from_slice(&bytes).map_err(|e| CheckError::invalid_body(SERVICE, e))?;

        body.version.filter(|v| !v.is_empty()).ok_or_else(|| {
            CheckError::RemoteCall(format!("no version in response from {}", self.url))
        })
    }
}

//! HTTP/JSON control-plane client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use http::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::{ControlPlaneApi, ControlPlaneConnector, SelfCheckResponse};
use crate::error::{CheckError, Result};
use crate::k8s::ClusterApi;

/// Kubernetes service (scheme:name:port) fronting the control-plane API.
pub const DEFAULT_CONTROL_PLANE_SERVICE: &str = "http:linkerd-controller-api:8085";

const API_PREFIX: &str = "/api/v1/";
const SERVICE: &str = "control plane API";

#[derive(Deserialize)]
struct VersionResponse {
    #[serde(alias = "version")]
    release_version: String,
}

/// Control-plane client speaking JSON over HTTP.
pub struct HttpControlPlaneClient {
    base: reqwest::Url,
    namespace: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpControlPlaneClient {
    /// Client talking straight to `addr` (`host:port` or a full URL).
    pub fn new_internal(namespace: &str, addr: &str, timeout: Duration) -> Result<Self> {
        let root = if addr.contains("://") {
            addr.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", addr.trim_end_matches('/'))
        };
        let raw = format!("{}{}", root, API_PREFIX);
        let base = reqwest::Url::parse(&raw).map_err(|e| {
            CheckError::ClientInit(format!("invalid control plane address \"{}\": {}", addr, e))
        })?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CheckError::ClientInit(e.to_string()))?;

        Ok(Self {
            base,
            namespace: namespace.to_string(),
            client,
            timeout,
        })
    }

    /// Client tunnelling through the cluster API's service proxy.
    pub fn new_external(
        namespace: &str,
        cluster: &dyn ClusterApi,
        service: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let path = format!("/services/{}/proxy{}", service, API_PREFIX);
        let base = cluster.url_for(namespace, &path)?;
        let client = cluster.new_client()?;

        Ok(Self {
            base,
            namespace: namespace.to_string(),
            client,
            timeout,
        })
    }

    /// Base URL every RPC path is joined onto.
    pub fn base_url(&self) -> &reqwest::Url {
        &self.base
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn call<T: DeserializeOwned>(&self, method: &str) -> Result<T> {
        let url = self
            .base
            .join(method)
            .map_err(|e| CheckError::ClientInit(format!("invalid RPC path {}: {}", method, e)))?;
        let endpoint = url.to_string();
        debug!(url = %endpoint, "control plane request");

        let rsp = self
            .client
            .post(url)
            .json(&serde_json::json!({}))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| CheckError::from_transport(&endpoint, self.timeout, e))?;

        if rsp.status() != StatusCode::OK {
            return Err(CheckError::unexpected_status(SERVICE, rsp.status()));
        }

        let bytes = rsp
            .bytes()
            .await
            .map_err(|e| CheckError::from_transport(&endpoint, self.timeout, e))?;

        serde_json::from_slice(&bytes)
            .map_err(|e| CheckError::RemoteCall(format!("invalid {} response: {}", method, e)))
    }
}

#[async_trait]
impl ControlPlaneApi for HttpControlPlaneClient {
    async fn self_check(&self) -> Result<SelfCheckResponse> {
        self.call("SelfCheck").await
    }

    async fn version(&self) -> Result<String> {
        let rsp: VersionResponse = self.call("Version").await?;
        Ok(rsp.release_version)
    }
}

/// Builds [`HttpControlPlaneClient`]s.
pub struct HttpControlPlaneConnector {
    service: String,
    timeout: Duration,
}

impl HttpControlPlaneConnector {
    pub fn new(service: impl Into<String>, timeout: Duration) -> Self {
        Self {
            service: service.into(),
            timeout,
        }
    }
}

impl Default for HttpControlPlaneConnector {
    fn default() -> Self {
        Self::new(DEFAULT_CONTROL_PLANE_SERVICE, Duration::from_secs(5))
    }
}

impl ControlPlaneConnector for HttpControlPlaneConnector {
    fn connect(
        &self,
        api_addr: Option<&str>,
        namespace: &str,
        cluster: Option<&Arc<dyn ClusterApi>>,
    ) -> Result<Arc<dyn ControlPlaneApi>> {
        let client = match api_addr.filter(|a| !a.is_empty()) {
            Some(addr) => HttpControlPlaneClient::new_internal(namespace, addr, self.timeout)?,
            None => {
                let cluster = cluster.ok_or(CheckError::MissingContext("Kubernetes API client"))?;
                HttpControlPlaneClient::new_external(
                    namespace,
                    cluster.as_ref(),
                    &self.service,
                    self.timeout,
                )?
            }
        };
        debug!(base = %client.base_url(), "resolved control plane API");
        Ok(Arc::new(client))
    }
}

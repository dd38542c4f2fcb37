//! HTTPS implementation of [`ClusterApi`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use http::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use http::StatusCode;
use tracing::debug;

use super::{ClusterApi, ClusterConnector, RestConfig, VersionInfo};
use crate::config::ClusterConfig;
use crate::error::{CheckError, Result};

const SERVICE: &str = "Kubernetes API";

/// Cluster API client built from a [`RestConfig`].
#[derive(Debug, Clone)]
pub struct KubernetesApi {
    config: RestConfig,
    timeout: Duration,
}

impl KubernetesApi {
    /// Create an API handle; every request is bounded by `timeout`.
    pub fn new(config: RestConfig, timeout: Duration) -> Result<Self> {
        reqwest::Url::parse(&config.server).map_err(|e| {
            CheckError::ClientInit(format!("invalid API server URL \"{}\": {}", config.server, e))
        })?;
        Ok(Self { config, timeout })
    }

    /// API server base URL.
    pub fn server(&self) -> &str {
        &self.config.server
    }

    fn endpoint(&self, path: &str) -> Result<reqwest::Url> {
        let raw = format!("{}{}", self.config.server, path);
        reqwest::Url::parse(&raw)
            .map_err(|e| CheckError::ClientInit(format!("invalid URL \"{}\": {}", raw, e)))
    }

    async fn get(&self, client: &reqwest::Client, url: reqwest::Url) -> Result<reqwest::Response> {
        debug!(url = %url, "cluster API request");
        let endpoint = url.to_string();
        client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| CheckError::from_transport(&endpoint, self.timeout, e))
    }
}

#[async_trait]
impl ClusterApi for KubernetesApi {
    fn url_for(&self, namespace: &str, path: &str) -> Result<reqwest::Url> {
        if !path.starts_with('/') {
            return Err(CheckError::ClientInit(format!(
                "path must start with a slash: \"{}\"",
                path
            )));
        }
        self.endpoint(&format!("/api/v1/namespaces/{}{}", namespace, path))
    }

    fn new_client(&self) -> Result<reqwest::Client> {
        let init_err = |e: reqwest::Error| {
            CheckError::ClientInit(format!("error instantiating Kubernetes API client: {}", e))
        };

        let mut builder = reqwest::Client::builder().timeout(self.timeout);

        if let Some(ca) = &self.config.ca_pem {
            let cert = reqwest::Certificate::from_pem(ca).map_err(init_err)?;
            builder = builder.add_root_certificate(cert);
        }

        if let Some(identity) = &self.config.identity_pem {
            let identity = reqwest::Identity::from_pem(identity).map_err(init_err)?;
            builder = builder.identity(identity);
        }

        if self.config.insecure {
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(token) = &self.config.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
                CheckError::ClientInit("bearer token contains invalid characters".to_string())
            })?;
            value.set_sensitive(true);

            let mut headers = HeaderMap::new();
            headers.insert(AUTHORIZATION, value);
            builder = builder.default_headers(headers);
        }

        builder.build().map_err(init_err)
    }

    async fn get_version_info(&self, client: &reqwest::Client) -> Result<VersionInfo> {
        let rsp = self.get(client, self.endpoint("/version")?).await?;

        if rsp.status() != StatusCode::OK {
            return Err(CheckError::unexpected_status(SERVICE, rsp.status()));
        }

        let body = rsp
            .bytes()
            .await
            .map_err(|e| CheckError::from_transport("/version", self.timeout, e))?;

        serde_json::from_slice(&body).map_err(|e| CheckError::invalid_body(SERVICE, e))
    }

    async fn check_namespace_exists(
        &self,
        client: &reqwest::Client,
        namespace: &str,
    ) -> Result<()> {
        let url = self.endpoint(&format!("/api/v1/namespaces/{}", namespace))?;
        let rsp = self.get(client, url).await?;

        match rsp.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => Err(CheckError::NamespaceNotFound(namespace.to_string())),
            status => Err(CheckError::unexpected_status(SERVICE, status)),
        }
    }
}

/// Connects using kubeconfig plus environment overrides.
pub struct KubeconfigConnector {
    config: ClusterConfig,
    timeout: Duration,
}

impl KubeconfigConnector {
    pub fn new(config: ClusterConfig, timeout: Duration) -> Self {
        Self { config, timeout }
    }
}

impl ClusterConnector for KubeconfigConnector {
    fn connect(&self) -> Result<Arc<dyn ClusterApi>> {
        let rest = RestConfig::load(&self.config)?;
        debug!(server = %rest.server, "resolved Kubernetes API server");
        Ok(Arc::new(KubernetesApi::new(rest, self.timeout)?))
    }
}

//! Kubernetes API access.
//!
//! The health checks only need a handful of cluster API calls, expressed by
//! the [`ClusterApi`] trait. [`KubernetesApi`] implements it over HTTPS with
//! credentials resolved from a kubeconfig file (see [`RestConfig`]).
//!
//! # Example
//!
//! ```rust,ignore
//! use meshcheck::config::ClusterConfig;
//! use meshcheck::k8s::{ClusterConnector, KubeconfigConnector};
//!
//! let connector = KubeconfigConnector::new(ClusterConfig::from_env()?, timeout);
//! let api = connector.connect()?;
//! let client = api.new_client()?;
//! let info = api.get_version_info(&client).await?;
//! println!("cluster is running {}", info.git_version);
//! ```

mod api;
mod kubeconfig;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::Result;

pub use api::{KubeconfigConnector, KubernetesApi};
pub use kubeconfig::{Kubeconfig, RestConfig};

/// Version information served by the cluster's `/version` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VersionInfo {
    pub major: String,
    pub minor: String,
    pub git_version: String,
    pub git_commit: String,
    pub build_date: String,
    pub platform: String,
}

/// Cluster API operations consumed by the health checks.
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// URL of `path` under `namespace`; `path` must start with `/`.
    fn url_for(&self, namespace: &str, path: &str) -> Result<reqwest::Url>;

    /// Build an authenticated HTTP client for this cluster.
    fn new_client(&self) -> Result<reqwest::Client>;

    /// Fetch the cluster's version information.
    async fn get_version_info(&self, client: &reqwest::Client) -> Result<VersionInfo>;

    /// Fail with `NamespaceNotFound` when `namespace` is absent.
    async fn check_namespace_exists(&self, client: &reqwest::Client, namespace: &str) -> Result<()>;
}

/// Produces a [`ClusterApi`] handle.
///
/// Connecting is the first fatal check of a run, so configuration problems
/// surface as a check outcome rather than a startup error.
pub trait ClusterConnector: Send + Sync {
    fn connect(&self) -> Result<Arc<dyn ClusterApi>>;
}

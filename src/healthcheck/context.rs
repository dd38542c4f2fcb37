//! Run-scoped state threaded through the checks.

use std::sync::Arc;

use crate::control_plane::ControlPlaneApi;
use crate::error::{CheckError, Result};
use crate::k8s::{ClusterApi, VersionInfo};

/// State written by earlier checks and read by later ones.
///
/// Field ownership (who writes what) for the built-in checks:
/// - `cluster_api`: `kubernetes-api` / "can initialize the client"
/// - `http_client`, `cluster_version`: `kubernetes-api` / "can query the Kubernetes API"
/// - `control_plane`: `control-plane-api` / "can initialize the client"
/// - `latest_version`: `control-plane-version` / "can get the latest version"
///
/// Every getter returns [`CheckError::MissingContext`] when the field has
/// not been written yet in the current run.
#[derive(Default)]
pub struct PipelineContext {
    cluster_api: Option<Arc<dyn ClusterApi>>,
    http_client: Option<reqwest::Client>,
    cluster_version: Option<VersionInfo>,
    control_plane: Option<Arc<dyn ControlPlaneApi>>,
    latest_version: Option<String>,
}

impl PipelineContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cluster_api(&self) -> Result<&Arc<dyn ClusterApi>> {
        self.cluster_api
            .as_ref()
            .ok_or(CheckError::MissingContext("Kubernetes API client"))
    }

    pub fn set_cluster_api(&mut self, api: Arc<dyn ClusterApi>) {
        self.cluster_api = Some(api);
    }

    pub fn http_client(&self) -> Result<&reqwest::Client> {
        self.http_client
            .as_ref()
            .ok_or(CheckError::MissingContext("Kubernetes HTTP client"))
    }

    pub fn set_http_client(&mut self, client: reqwest::Client) {
        self.http_client = Some(client);
    }

    pub fn cluster_version(&self) -> Result<&VersionInfo> {
        self.cluster_version
            .as_ref()
            .ok_or(CheckError::MissingContext("Kubernetes version info"))
    }

    pub fn set_cluster_version(&mut self, info: VersionInfo) {
        self.cluster_version = Some(info);
    }

    pub fn control_plane(&self) -> Result<&Arc<dyn ControlPlaneApi>> {
        self.control_plane
            .as_ref()
            .ok_or(CheckError::MissingContext("control plane API client"))
    }

    pub fn set_control_plane(&mut self, api: Arc<dyn ControlPlaneApi>) {
        self.control_plane = Some(api);
    }

    pub fn latest_version(&self) -> Result<&str> {
        self.latest_version
            .as_deref()
            .ok_or(CheckError::MissingContext("latest version"))
    }

    pub fn set_latest_version(&mut self, version: impl Into<String>) {
        self.latest_version = Some(version.into());
    }
}

impl std::fmt::Debug for PipelineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineContext")
            .field("cluster_api", &self.cluster_api.is_some())
            .field("http_client", &self.http_client.is_some())
            .field("cluster_version", &self.cluster_version)
            .field("control_plane", &self.control_plane.is_some())
            .field("latest_version", &self.latest_version)
            .finish()
    }
}

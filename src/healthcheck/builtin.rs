//! Built-in check groups for the cluster, the control-plane API and
//! release freshness.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{Check, HealthChecker, LocalCheck, PipelineContext, RemoteCheck};
use crate::control_plane::{ControlPlaneConnector, SelfCheckResponse};
use crate::error::Result;
use crate::k8s::ClusterConnector;
use crate::version::{self, VersionLookup, VersionTriple};

pub const KUBERNETES_API: &str = "kubernetes-api";
pub const CONTROL_PLANE_API: &str = "control-plane-api";
pub const CONTROL_PLANE_VERSION: &str = "control-plane-version";

impl HealthChecker {
    /// Cluster reachability, minimum version and control-plane namespace.
    pub fn add_kubernetes_api_checks(
        &mut self,
        connector: Arc<dyn ClusterConnector>,
        namespace: &str,
    ) -> &mut Self {
        let required = self.min_kubernetes_version;
        self.add_check(Check::local(
            KUBERNETES_API,
            "can initialize the client",
            true,
            ConnectCluster { connector },
        ))
        .add_check(Check::local(
            KUBERNETES_API,
            "can query the Kubernetes API",
            true,
            QueryCluster,
        ))
        .add_check(Check::local(
            KUBERNETES_API,
            "is running the minimum Kubernetes API version",
            false,
            MinimumClusterVersion { required },
        ))
        .add_check(Check::local(
            KUBERNETES_API,
            "control plane namespace exists",
            true,
            NamespaceExists {
                namespace: namespace.to_string(),
            },
        ))
    }

    /// Control-plane client setup followed by its self-check.
    ///
    /// With no `api_addr` the client is discovered through the cluster API,
    /// so the Kubernetes checks must be registered first.
    pub fn add_control_plane_api_checks(
        &mut self,
        connector: Arc<dyn ControlPlaneConnector>,
        api_addr: Option<String>,
        namespace: &str,
    ) -> &mut Self {
        self.add_check(Check::local(
            CONTROL_PLANE_API,
            "can initialize the client",
            true,
            ConnectControlPlane {
                connector,
                api_addr,
                namespace: namespace.to_string(),
            },
        ))
        .add_check(Check::remote(
            CONTROL_PLANE_API,
            "can query the control plane API",
            true,
            SelfCheck,
        ))
    }

    /// Compare the CLI and the control plane against the latest release.
    ///
    /// `version_override` replaces the lookup when set.
    pub fn add_version_checks(
        &mut self,
        lookup: Arc<dyn VersionLookup>,
        version_override: Option<String>,
    ) -> &mut Self {
        let current = self.client_version.clone();
        self.add_check(Check::local(
            CONTROL_PLANE_VERSION,
            "can get the latest version",
            true,
            LatestVersion {
                lookup,
                version_override,
            },
        ))
        .add_check(Check::local(
            CONTROL_PLANE_VERSION,
            "cli is up-to-date",
            false,
            ClientUpToDate { current },
        ))
        .add_check(Check::local(
            CONTROL_PLANE_VERSION,
            "control plane is up-to-date",
            false,
            ControlPlaneUpToDate,
        ))
    }
}

struct ConnectCluster {
    connector: Arc<dyn ClusterConnector>,
}

#[async_trait]
impl LocalCheck for ConnectCluster {
    async fn run(&self, ctx: &mut PipelineContext) -> Result<()> {
        ctx.set_cluster_api(self.connector.connect()?);
        Ok(())
    }
}

struct QueryCluster;

#[async_trait]
impl LocalCheck for QueryCluster {
    async fn run(&self, ctx: &mut PipelineContext) -> Result<()> {
        let api = ctx.cluster_api()?.clone();
        let client = api.new_client()?;
        ctx.set_http_client(client.clone());

        let info = api.get_version_info(&client).await?;
        debug!(version = %info.git_version, "Kubernetes API version");
        ctx.set_cluster_version(info);
        Ok(())
    }
}

struct MinimumClusterVersion {
    required: VersionTriple,
}

#[async_trait]
impl LocalCheck for MinimumClusterVersion {
    async fn run(&self, ctx: &mut PipelineContext) -> Result<()> {
        let actual = VersionTriple::parse(&ctx.cluster_version()?.git_version)?;
        actual.require("Kubernetes", &self.required)
    }
}

struct NamespaceExists {
    namespace: String,
}

#[async_trait]
impl LocalCheck for NamespaceExists {
    async fn run(&self, ctx: &mut PipelineContext) -> Result<()> {
        let api = ctx.cluster_api()?;
        let client = ctx.http_client()?;
        api.check_namespace_exists(client, &self.namespace).await
    }
}

struct ConnectControlPlane {
    connector: Arc<dyn ControlPlaneConnector>,
    api_addr: Option<String>,
    namespace: String,
}

#[async_trait]
impl LocalCheck for ConnectControlPlane {
    async fn run(&self, ctx: &mut PipelineContext) -> Result<()> {
        let api = self.connector.connect(
            self.api_addr.as_deref(),
            &self.namespace,
            ctx.cluster_api().ok(),
        )?;
        ctx.set_control_plane(api);
        Ok(())
    }
}

struct SelfCheck;

#[async_trait]
impl RemoteCheck for SelfCheck {
    async fn run(&self, ctx: &PipelineContext) -> Result<SelfCheckResponse> {
        ctx.control_plane()?.self_check().await
    }
}

struct LatestVersion {
    lookup: Arc<dyn VersionLookup>,
    version_override: Option<String>,
}

#[async_trait]
impl LocalCheck for LatestVersion {
    async fn run(&self, ctx: &mut PipelineContext) -> Result<()> {
        let latest = match self.version_override.as_deref().filter(|v| !v.is_empty()) {
            Some(v) => v.to_string(),
            None => self.lookup.latest_version().await?,
        };
        debug!(latest = %latest, "latest release");
        ctx.set_latest_version(latest);
        Ok(())
    }
}

struct ClientUpToDate {
    current: String,
}

#[async_trait]
impl LocalCheck for ClientUpToDate {
    async fn run(&self, ctx: &mut PipelineContext) -> Result<()> {
        version::check_client_version(&self.current, ctx.latest_version()?)
    }
}

struct ControlPlaneUpToDate;

#[async_trait]
impl LocalCheck for ControlPlaneUpToDate {
    async fn run(&self, ctx: &mut PipelineContext) -> Result<()> {
        let latest = ctx.latest_version()?;
        version::check_server_version(ctx.control_plane()?.as_ref(), latest).await
    }
}

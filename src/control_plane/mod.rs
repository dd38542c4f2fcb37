//! Control-plane API access.
//!
//! The control plane exposes a self-check RPC that reports one result per
//! internal subsystem, and a version RPC. [`HttpControlPlaneClient`] reaches
//! it either directly by address or through the Kubernetes API service proxy.

mod client;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::k8s::ClusterApi;

pub use client::{HttpControlPlaneClient, HttpControlPlaneConnector, DEFAULT_CONTROL_PLANE_SERVICE};

/// Status reported by a subsystem self-check.
///
/// Only `Ok` passes; any other value, including statuses this client does
/// not know about, is a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckStatus {
    Ok,
    Fail,
    Error,
    #[serde(other)]
    Unknown,
}

impl CheckStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, CheckStatus::Ok)
    }
}

/// One subsystem's outcome within a self-check response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubsystemResult {
    pub subsystem_name: String,
    pub check_description: String,
    pub status: CheckStatus,
    #[serde(default)]
    pub friendly_message_to_user: String,
}

impl SubsystemResult {
    pub fn ok(subsystem: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            subsystem_name: subsystem.into(),
            check_description: description.into(),
            status: CheckStatus::Ok,
            friendly_message_to_user: String::new(),
        }
    }

    pub fn failed(
        subsystem: impl Into<String>,
        description: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            subsystem_name: subsystem.into(),
            check_description: description.into(),
            status: CheckStatus::Fail,
            friendly_message_to_user: message.into(),
        }
    }
}

/// Self-check response: results in the order the control plane ran them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfCheckResponse {
    #[serde(default)]
    pub results: Vec<SubsystemResult>,
}

/// Control-plane RPCs consumed by the health checks.
#[async_trait]
pub trait ControlPlaneApi: Send + Sync {
    async fn self_check(&self) -> Result<SelfCheckResponse>;

    /// Release version of the running control plane.
    async fn version(&self) -> Result<String>;
}

/// Produces a [`ControlPlaneApi`] handle.
pub trait ControlPlaneConnector: Send + Sync {
    /// Direct client when `api_addr` is set, otherwise discovery through
    /// `cluster` and `namespace`.
    fn connect(
        &self,
        api_addr: Option<&str>,
        namespace: &str,
        cluster: Option<&Arc<dyn ClusterApi>>,
    ) -> Result<Arc<dyn ControlPlaneApi>>;
}

//! Check pipeline configuration.

use std::time::Duration;

use super::parse::{env_bool, env_opt, env_or, env_parse, env_timeout};
use super::ConfigError;
use crate::control_plane::DEFAULT_CONTROL_PLANE_SERVICE;
use crate::healthcheck::DEFAULT_MIN_KUBERNETES_VERSION;
use crate::version::{VersionTriple, DEFAULT_VERSION_CHECK_URL};

/// Which checks run and against what.
#[derive(Clone, Debug)]
pub struct CheckConfig {
    /// Namespace the control plane is installed in.
    pub namespace: String,
    /// Direct control-plane address; discovery through the cluster API when unset.
    pub api_addr: Option<String>,
    /// Latest release override; skips the version lookup.
    pub expected_version: Option<String>,
    pub min_kubernetes_version: VersionTriple,
    /// Deadline for the self-check RPC.
    pub rpc_timeout: Duration,
    /// Per-request deadline for every outbound HTTP call.
    pub request_timeout: Duration,
    pub version_check_url: String,
    pub skip_version_checks: bool,
    /// Control-plane API service, as `scheme:name:port`.
    pub control_plane_service: String,
}

impl CheckConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let min_kubernetes_version =
            env_parse("MIN_KUBERNETES_VERSION", DEFAULT_MIN_KUBERNETES_VERSION)?;
        let control_plane_service = env_or("CONTROL_PLANE_SERVICE", DEFAULT_CONTROL_PLANE_SERVICE);

        Ok(Self {
            namespace: env_or("CONTROL_PLANE_NAMESPACE", "linkerd"),
            api_addr: env_opt("API_ADDR"),
            expected_version: env_opt("EXPECTED_VERSION"),
            min_kubernetes_version,
            rpc_timeout: env_timeout("RPC_TIMEOUT", "5s")?,
            request_timeout: env_timeout("REQUEST_TIMEOUT", "5s")?,
            version_check_url: env_or("VERSION_CHECK_URL", DEFAULT_VERSION_CHECK_URL),
            skip_version_checks: env_bool("SKIP_VERSION_CHECKS", false),
            control_plane_service,
        })
    }
}

//! Kubernetes API access configuration.

use std::path::PathBuf;

use super::parse::{env_bool, env_opt};
use super::ConfigError;

/// Where the cluster API lives and how to authenticate to it.
#[derive(Clone, Debug, Default)]
pub struct ClusterConfig {
    /// Kubeconfig file (KUBECONFIG, first entry; else ~/.kube/config).
    pub kubeconfig: Option<PathBuf>,
    /// Context overriding the kubeconfig's current context.
    pub context: Option<String>,
    /// API server URL overriding the kubeconfig's cluster.
    pub api_server: Option<String>,
    /// Bearer token overriding the kubeconfig's user.
    pub token: Option<String>,
    /// Skip TLS verification of the API server.
    pub insecure: bool,
}

impl ClusterConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            kubeconfig: Self::resolve_kubeconfig(),
            context: env_opt("KUBE_CONTEXT"),
            api_server: env_opt("KUBE_API_SERVER"),
            token: env_opt("KUBE_TOKEN"),
            insecure: env_bool("KUBE_INSECURE", false),
        })
    }

    fn resolve_kubeconfig() -> Option<PathBuf> {
        if let Some(list) = env_opt("KUBECONFIG") {
            return std::env::split_paths(&list).find(|p| !p.as_os_str().is_empty());
        }
        env_opt("HOME").map(|home| PathBuf::from(home).join(".kube").join("config"))
    }
}

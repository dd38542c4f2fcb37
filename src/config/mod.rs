//! Configuration module for meshcheck.
//!
//! This module provides centralized configuration loading from environment variables.
//!
//! # Example
//!
//! ```rust,ignore
//! use meshcheck::config::Config;
//!
//! let config = Config::from_env()?;
//! println!("Namespace: {}", config.check.namespace);
//! println!("RPC timeout: {:?}", config.check.rpc_timeout);
//! ```

mod check;
mod cluster;
mod error;
mod logging;
mod parse;

pub use check::CheckConfig;
pub use cluster::ClusterConfig;
pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};

/// Complete application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Cluster API access.
    pub cluster: ClusterConfig,
    /// Check pipeline settings.
    pub check: CheckConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            cluster: ClusterConfig::from_env()?,
            check: CheckConfig::from_env()?,
            logging: LoggingConfig::from_env()?,
        })
    }

    /// Print configuration summary to log.
    pub fn log_summary(&self) {
        use tracing::info;

        info!("Configuration loaded:");
        match &self.cluster.kubeconfig {
            Some(path) => info!("  Kubeconfig: {}", path.display()),
            None => info!("  Kubeconfig: none"),
        }
        if let Some(ref context) = self.cluster.context {
            info!("  Context: {}", context);
        }
        if let Some(ref server) = self.cluster.api_server {
            info!("  API server: {}", server);
        }
        if self.cluster.insecure {
            info!("  TLS verification: disabled");
        }

        info!("  Namespace: {}", self.check.namespace);
        match &self.check.api_addr {
            Some(addr) => info!("  Control plane: {}", addr),
            None => info!("  Control plane: via {}", self.check.control_plane_service),
        }
        info!("  Min Kubernetes: {}", self.check.min_kubernetes_version);
        info!(
            "  Timeouts: rpc {}ms, request {}ms",
            self.check.rpc_timeout.as_millis(),
            self.check.request_timeout.as_millis()
        );

        if self.check.skip_version_checks {
            info!("  Version checks: skipped");
        } else if let Some(ref version) = self.check.expected_version {
            info!("  Expected version: {}", version);
        } else {
            info!("  Version check: {}", self.check.version_check_url);
        }
    }
}

//! meshcheck - pre-flight diagnostics for a service-mesh control plane.
//!
//! This crate verifies that the Kubernetes cluster hosting a control plane
//! is reachable and recent enough, that the control plane's API answers its
//! own self-check, and that both the CLI and the control plane run the
//! latest release. Each verification outcome is handed to a caller-supplied
//! observer as soon as it is known.
//!
//! # Architecture
//!
//! - [`healthcheck`] - ordered check execution with fatal/non-fatal policy
//! - [`version`] - version parsing, comparison and latest-release lookup
//! - [`k8s`] - cluster API access via kubeconfig
//! - [`control_plane`] - control-plane self-check and version RPCs
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use meshcheck::healthcheck::HealthChecker;
//! use meshcheck::k8s::KubeconfigConnector;
//! use meshcheck::control_plane::HttpControlPlaneConnector;
//!
//! let mut checker = HealthChecker::new();
//! checker
//!     .add_kubernetes_api_checks(
//!         Arc::new(KubeconfigConnector::new(cluster, timeout)),
//!         "linkerd",
//!     )
//!     .add_control_plane_api_checks(
//!         Arc::new(HttpControlPlaneConnector::default()),
//!         None,
//!         "linkerd",
//!     );
//!
//! let ok = checker.run_checks(|outcome| println!("{:?}", outcome)).await;
//! ```

/// Package version from Cargo.toml
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Git commit hash (8 chars) with optional "-dirty" suffix
pub const BUILD_VERSION: &str = env!("BUILD_VERSION");

/// Full version string: "0.1.0 (abc12345)" or "0.1.0 (abc12345-dirty)"
pub const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BUILD_VERSION"), ")");

pub mod config;
pub mod control_plane;
pub mod error;
pub mod healthcheck;
pub mod k8s;
pub mod logging;
pub mod version;

// Re-exports for convenience
pub use config::Config;
pub use error::{CheckError, Result};
pub use healthcheck::{Check, HealthChecker, LeafOutcome, PipelineContext};
pub use version::VersionTriple;

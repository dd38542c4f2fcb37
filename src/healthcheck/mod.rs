//! Check orchestration.
//!
//! A [`HealthChecker`] owns an ordered list of [`Check`]s and runs them one
//! at a time against a shared [`PipelineContext`]. Each check is either a
//! local action returning success or an error, or a remote action whose
//! response expands into one outcome per subsystem.
//!
//! # Example
//!
//! ```rust,ignore
//! use meshcheck::healthcheck::HealthChecker;
//!
//! let mut checker = HealthChecker::new();
//! checker
//!     .add_kubernetes_api_checks(cluster, "linkerd")
//!     .add_control_plane_api_checks(control_plane, None, "linkerd");
//!
//! let ok = checker
//!     .run_checks(|outcome| println!("{} {}", outcome.category, outcome.description))
//!     .await;
//! ```

mod builtin;
mod check;
mod checker;
mod context;

pub use builtin::{CONTROL_PLANE_API, CONTROL_PLANE_VERSION, KUBERNETES_API};
pub use check::{Action, Check, LeafOutcome, LocalCheck, RemoteCheck};
pub use checker::{HealthChecker, DEFAULT_MIN_KUBERNETES_VERSION, DEFAULT_RPC_TIMEOUT};
pub use context::PipelineContext;

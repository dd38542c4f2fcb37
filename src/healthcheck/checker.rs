//! Ordered check execution.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::{Action, Check, LeafOutcome, PipelineContext};
use crate::control_plane::ControlPlaneApi;
use crate::error::CheckError;
use crate::version::VersionTriple;

/// Default deadline for a remote self-check call.
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(5);

/// Minimum Kubernetes version accepted by default.
pub const DEFAULT_MIN_KUBERNETES_VERSION: VersionTriple = VersionTriple::new(1, 8, 0);

/// Runs registered checks in order and reports each outcome to an observer.
///
/// Checks run strictly one at a time in registration order. A failing
/// fatal check stops the run. Remote checks fan out into one outcome per
/// subsystem result, and their fatal flag only covers the call itself.
pub struct HealthChecker {
    checks: Vec<Check>,
    context: PipelineContext,
    pub(super) rpc_timeout: Duration,
    pub(super) min_kubernetes_version: VersionTriple,
    pub(super) client_version: String,
}

impl HealthChecker {
    pub fn new() -> Self {
        Self {
            checks: Vec::new(),
            context: PipelineContext::default(),
            rpc_timeout: DEFAULT_RPC_TIMEOUT,
            min_kubernetes_version: DEFAULT_MIN_KUBERNETES_VERSION,
            client_version: crate::PKG_VERSION.to_string(),
        }
    }

    /// Deadline applied to each remote check.
    pub fn with_rpc_timeout(mut self, timeout: Duration) -> Self {
        self.rpc_timeout = timeout;
        self
    }

    /// Minimum cluster version; must be set before the Kubernetes checks are added.
    pub fn with_min_kubernetes_version(mut self, version: VersionTriple) -> Self {
        self.min_kubernetes_version = version;
        self
    }

    /// Version the CLI reports as its own; must be set before the version checks are added.
    pub fn with_client_version(mut self, version: impl Into<String>) -> Self {
        self.client_version = version.into();
        self
    }

    pub fn add_check(&mut self, check: Check) -> &mut Self {
        self.checks.push(check);
        self
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    /// Distinct categories in first-registration order.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for check in &self.checks {
            if !seen.contains(&check.category.as_str()) {
                seen.push(&check.category);
            }
        }
        seen
    }

    pub fn checks_in<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Check> + 'a {
        self.checks.iter().filter(move |c| c.category == category)
    }

    /// Control-plane client resolved by the last run, if any.
    pub fn control_plane_client(&self) -> Option<Arc<dyn ControlPlaneApi>> {
        self.context.control_plane().ok().cloned()
    }

    /// Pipeline state left behind by the last run.
    pub fn context(&self) -> &PipelineContext {
        &self.context
    }

    /// Run every check in order, calling `observer` once per outcome.
    ///
    /// Returns true if no outcome carried an error. Each run starts from a
    /// fresh [`PipelineContext`].
    pub async fn run_checks<F>(&mut self, mut observer: F) -> bool
    where
        F: FnMut(&LeafOutcome),
    {
        self.context = PipelineContext::default();
        let mut success = true;

        for check in &self.checks {
            debug!(
                category = %check.category,
                description = %check.description,
                fatal = check.fatal,
                "running check"
            );

            match &check.action {
                Action::Local(action) => {
                    let result = action.run(&mut self.context).await;
                    let failed = result.is_err();

                    observer(&LeafOutcome {
                        category: check.category.clone(),
                        description: check.description.clone(),
                        error: result.err(),
                    });

                    if failed {
                        success = false;
                        if check.fatal {
                            warn!(
                                category = %check.category,
                                description = %check.description,
                                "fatal check failed, stopping"
                            );
                            return false;
                        }
                    }
                }
                Action::Remote(action) => {
                    let call = action.run(&self.context);
                    let result = match tokio::time::timeout(self.rpc_timeout, call).await {
                        Ok(result) => result,
                        Err(_) => Err(CheckError::Timeout {
                            operation: check.description.clone(),
                            timeout_ms: self.rpc_timeout.as_millis() as u64,
                        }),
                    };

                    match result {
                        Err(err) => {
                            observer(&LeafOutcome {
                                category: check.category.clone(),
                                description: check.description.clone(),
                                error: Some(err),
                            });

                            success = false;
                            if check.fatal {
                                warn!(
                                    category = %check.category,
                                    description = %check.description,
                                    "fatal remote check failed, stopping"
                                );
                                return false;
                            }
                        }
                        Ok(rsp) => {
                            debug!(
                                category = %check.category,
                                results = rsp.results.len(),
                                "remote check returned"
                            );

                            for sub in rsp.results {
                                let error = if sub.status.is_ok() {
                                    None
                                } else {
                                    success = false;
                                    Some(CheckError::SubsystemFailure(sub.friendly_message_to_user))
                                };

                                observer(&LeafOutcome {
                                    category: format!("{}[{}]", check.category, sub.subsystem_name),
                                    description: sub.check_description,
                                    error,
                                });
                            }
                        }
                    }
                }
            }
        }

        success
    }
}

impl Default for HealthChecker {
    fn default() -> Self {
        Self::new()
    }
}

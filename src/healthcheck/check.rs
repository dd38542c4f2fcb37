//! Check definitions.

use std::future::Future;

use async_trait::async_trait;

use super::PipelineContext;
use crate::control_plane::SelfCheckResponse;
use crate::error::{CheckError, Result};

/// An inline verification over the pipeline state.
#[async_trait]
pub trait LocalCheck: Send + Sync {
    async fn run(&self, ctx: &mut PipelineContext) -> Result<()>;
}

/// A delegated self-check yielding one result per remote subsystem.
#[async_trait]
pub trait RemoteCheck: Send + Sync {
    async fn run(&self, ctx: &PipelineContext) -> Result<SelfCheckResponse>;
}

/// What a check does when it runs.
pub enum Action {
    Local(Box<dyn LocalCheck>),
    Remote(Box<dyn RemoteCheck>),
}

impl Action {
    pub fn is_remote(&self) -> bool {
        matches!(self, Action::Remote(_))
    }
}

/// A registered, categorized unit of verification.
pub struct Check {
    pub category: String,
    pub description: String,
    /// A failing fatal check stops the run.
    pub fatal: bool,
    pub action: Action,
}

impl Check {
    pub fn local(
        category: impl Into<String>,
        description: impl Into<String>,
        fatal: bool,
        action: impl LocalCheck + 'static,
    ) -> Self {
        Self {
            category: category.into(),
            description: description.into(),
            fatal,
            action: Action::Local(Box::new(action)),
        }
    }

    pub fn remote(
        category: impl Into<String>,
        description: impl Into<String>,
        fatal: bool,
        action: impl RemoteCheck + 'static,
    ) -> Self {
        Self {
            category: category.into(),
            description: description.into(),
            fatal,
            action: Action::Remote(Box::new(action)),
        }
    }

    /// Local check from a synchronous closure.
    pub fn from_fn<F>(
        category: impl Into<String>,
        description: impl Into<String>,
        fatal: bool,
        f: F,
    ) -> Self
    where
        F: Fn(&mut PipelineContext) -> Result<()> + Send + Sync + 'static,
    {
        Self::local(category, description, fatal, LocalFn(f))
    }

    /// Remote check from an async closure that does not need the pipeline state.
    pub fn remote_fn<F, Fut>(
        category: impl Into<String>,
        description: impl Into<String>,
        fatal: bool,
        f: F,
    ) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<SelfCheckResponse>> + Send + 'static,
    {
        Self::remote(category, description, fatal, RemoteFn(f))
    }
}

impl std::fmt::Debug for Check {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Check")
            .field("category", &self.category)
            .field("description", &self.description)
            .field("fatal", &self.fatal)
            .field("remote", &self.action.is_remote())
            .finish()
    }
}

struct LocalFn<F>(F);

#[async_trait]
impl<F> LocalCheck for LocalFn<F>
where
    F: Fn(&mut PipelineContext) -> Result<()> + Send + Sync,
{
    async fn run(&self, ctx: &mut PipelineContext) -> Result<()> {
        (self.0)(ctx)
    }
}

struct RemoteFn<F>(F);

#[async_trait]
impl<F, Fut> RemoteCheck for RemoteFn<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<SelfCheckResponse>> + Send + 'static,
{
    async fn run(&self, _ctx: &PipelineContext) -> Result<SelfCheckResponse> {
        (self.0)().await
    }
}

/// One observed outcome: a local check, a failed remote call, or a single
/// subsystem result of a successful remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafOutcome {
    pub category: String,
    pub description: String,
    pub error: Option<CheckError>,
}

impl LeafOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

//! Check error taxonomy.
//!
//! Every failure a check can produce is a [`CheckError`]. Errors are
//! `Clone` so that observers can keep the outcomes they are handed.

use std::time::Duration;

use crate::version::VersionTriple;

/// Errors produced while running checks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckError {
    /// The cluster API or control-plane client could not be built.
    #[error("error configuring client: {0}")]
    ClientInit(String),

    /// Transport-level failure reaching an endpoint.
    #[error("error connecting to {endpoint}: {message}")]
    Connection { endpoint: String, message: String },

    /// A call did not complete within its deadline.
    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    /// Endpoint answered with an unexpected HTTP status.
    #[error("Unexpected {service} response: {status}")]
    Protocol { service: String, status: String },

    /// The requested namespace is not present in the cluster.
    #[error("The \"{0}\" namespace does not exist")]
    NamespaceNotFound(String),

    /// A version string has no parsable `major.minor.patch` prefix.
    #[error("Unable to parse version string \"{0}\"")]
    VersionParse(String),

    /// A version parsed fine but is older than required.
    #[error(
        "{subject} is on version [{actual}], but version [{required}] or more recent is required"
    )]
    VersionIncompatible {
        subject: String,
        actual: VersionTriple,
        required: VersionTriple,
    },

    /// The remote call returned something the client could not decode.
    #[error("control plane call failed: {0}")]
    RemoteCall(String),

    /// A subsystem reported a failed self-check; the message is the
    /// subsystem's own user-facing text.
    #[error("{0}")]
    SubsystemFailure(String),

    /// A check read pipeline state that no earlier check produced.
    #[error("{0} is not available; an earlier check must populate it")]
    MissingContext(&'static str),

    /// A component is not on the latest release.
    #[error("is running version {actual} but the latest version is {latest}")]
    VersionMismatch { actual: String, latest: String },
}

impl CheckError {
    /// Classify a transport error from an outbound HTTP request.
    ///
    /// Callers decode response bodies themselves so that a malformed body is
    /// reported against the service that sent it.
    pub fn from_transport(endpoint: &str, timeout: Duration, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CheckError::Timeout {
                operation: format!("request to {}", endpoint),
                timeout_ms: timeout.as_millis() as u64,
            }
        } else {
            CheckError::Connection {
                endpoint: endpoint.to_string(),
                message: err.to_string(),
            }
        }
    }

    /// Build a protocol error from an unexpected status code.
    pub fn unexpected_status(service: impl Into<String>, status: http::StatusCode) -> Self {
        CheckError::Protocol {
            service: service.into(),
            status: status.to_string(),
        }
    }

    /// Build a protocol error from a response body that does not decode.
    pub fn invalid_body(service: impl Into<String>, err: impl std::fmt::Display) -> Self {
        CheckError::Protocol {
            service: service.into(),
            status: format!("invalid body ({})", err),
        }
    }

    /// Returns true if this error came from a deadline expiring.
    pub fn is_timeout(&self) -> bool {
        matches!(self, CheckError::Timeout { .. })
    }
}

/// Result type alias for check operations.
pub type Result<T> = std::result::Result<T, CheckError>;

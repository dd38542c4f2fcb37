//! Version parsing, comparison and freshness checks.
//!
//! - [`VersionTriple`] parses free-form version strings (`v1.9.3-gke.2`)
//!   and compares them against a configured minimum.
//! - [`VersionLookup`] fetches the latest published release.
//! - [`check_client_version`] / [`check_server_version`] compare the CLI
//!   and the running control plane against that release.

mod lookup;
mod triple;

pub use lookup::{HttpVersionLookup, VersionLookup, DEFAULT_VERSION_CHECK_URL};
pub use triple::VersionTriple;

use crate::control_plane::ControlPlaneApi;
use crate::error::{CheckError, Result};

/// Fail unless the CLI's own version is the latest release.
pub fn check_client_version(current: &str, latest: &str) -> Result<()> {
    ensure_latest(current, latest)
}

/// Fail unless the control plane reports the latest release.
pub async fn check_server_version(api: &dyn ControlPlaneApi, latest: &str) -> Result<()> {
    let server = api.version().await?;
    ensure_latest(&server, latest)
}

fn ensure_latest(actual: &str, latest: &str) -> Result<()> {
    if actual.trim() == latest.trim() {
        Ok(())
    } else {
        Err(CheckError::VersionMismatch {
            actual: actual.to_string(),
            latest: latest.to_string(),
        })
    }
}

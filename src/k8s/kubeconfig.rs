//! Kubeconfig loading.
//!
//! Only the subset needed to reach the API server is understood: the
//! selected context's cluster (server, CA, TLS verification) and user
//! (bearer token or client certificate).

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;

use crate::config::ClusterConfig;
use crate::error::{CheckError, Result};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Kubeconfig {
    pub current_context: Option<String>,
    pub clusters: Vec<NamedCluster>,
    pub contexts: Vec<NamedContext>,
    pub users: Vec<NamedUser>,
}

#[derive(Debug, Deserialize)]
pub struct NamedCluster {
    pub name: String,
    pub cluster: ClusterEntry,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ClusterEntry {
    pub server: String,
    pub certificate_authority: Option<PathBuf>,
    pub certificate_authority_data: Option<String>,
    pub insecure_skip_tls_verify: bool,
}

#[derive(Debug, Deserialize)]
pub struct NamedContext {
    pub name: String,
    pub context: ContextEntry,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ContextEntry {
    pub cluster: String,
    pub user: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NamedUser {
    pub name: String,
    #[serde(default)]
    pub user: UserEntry,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct UserEntry {
    pub token: Option<String>,
    #[serde(rename = "tokenFile")]
    pub token_file: Option<PathBuf>,
    pub client_certificate: Option<PathBuf>,
    pub client_certificate_data: Option<String>,
    pub client_key: Option<PathBuf>,
    pub client_key_data: Option<String>,
}

/// Everything needed to build an authenticated client for one API server.
#[derive(Clone, Default)]
pub struct RestConfig {
    /// API server base URL, without trailing slash.
    pub server: String,
    /// PEM-encoded CA bundle.
    pub ca_pem: Option<Vec<u8>>,
    /// PEM-encoded client certificate followed by its key.
    pub identity_pem: Option<Vec<u8>>,
    pub token: Option<String>,
    pub insecure: bool,
}

impl std::fmt::Debug for RestConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestConfig")
            .field("server", &self.server)
            .field("ca_pem", &self.ca_pem.is_some())
            .field("identity_pem", &self.identity_pem.is_some())
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("insecure", &self.insecure)
            .finish()
    }
}

impl Kubeconfig {
    /// Read and parse a kubeconfig file.
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CheckError::ClientInit(format!("failed to read kubeconfig {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| CheckError::ClientInit(format!("invalid kubeconfig: {}", e)))
    }

    /// Resolve the named (or current) context into a [`RestConfig`].
    ///
    /// Relative certificate and token paths are resolved against `base_dir`.
    pub fn resolve(&self, context: Option<&str>, base_dir: &Path) -> Result<RestConfig> {
        let context_name = context
            .or(self.current_context.as_deref())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| CheckError::ClientInit("kubeconfig has no current context".into()))?;

        let ctx = self
            .contexts
            .iter()
            .find(|c| c.name == context_name)
            .map(|c| &c.context)
            .ok_or_else(|| {
                CheckError::ClientInit(format!(
                    "context \"{}\" not found in kubeconfig",
                    context_name
                ))
            })?;

        let cluster = self
            .clusters
            .iter()
            .find(|c| c.name == ctx.cluster)
            .map(|c| &c.cluster)
            .ok_or_else(|| {
                CheckError::ClientInit(format!(
                    "cluster \"{}\" not found in kubeconfig",
                    ctx.cluster
                ))
            })?;

        if cluster.server.is_empty() {
            return Err(CheckError::ClientInit(format!(
                "cluster \"{}\" has no server",
                ctx.cluster
            )));
        }

        let mut rest = RestConfig {
            server: cluster.server.trim_end_matches('/').to_string(),
            insecure: cluster.insecure_skip_tls_verify,
            ca_pem: pem_source(
                cluster.certificate_authority_data.as_deref(),
                cluster.certificate_authority.as_deref(),
                base_dir,
            )?,
            ..Default::default()
        };

        // A context without a user is valid (e.g. anonymous access via a proxy)
        let user = match ctx.user.as_deref() {
            Some(name) => self.users.iter().find(|u| u.name == name).map(|u| &u.user),
            None => None,
        };

        if let Some(user) = user {
            rest.token = match (&user.token, &user.token_file) {
                (Some(token), _) => Some(token.clone()),
                (None, Some(file)) => Some(
                    read_file(&base_dir.join(file))
                        .map(|b| String::from_utf8_lossy(&b).trim().to_string())?,
                ),
                (None, None) => None,
            };

            let cert = pem_source(
                user.client_certificate_data.as_deref(),
                user.client_certificate.as_deref(),
                base_dir,
            )?;
            let key = pem_source(
                user.client_key_data.as_deref(),
                user.client_key.as_deref(),
                base_dir,
            )?;
            if let (Some(mut cert), Some(key)) = (cert, key) {
                cert.push(b'\n');
                cert.extend_from_slice(&key);
                rest.identity_pem = Some(cert);
            }
        }

        Ok(rest)
    }
}

impl RestConfig {
    /// Build the effective REST configuration from cluster settings.
    ///
    /// An explicit API server override works without any kubeconfig file.
    pub fn load(config: &ClusterConfig) -> Result<Self> {
        let mut rest = match &config.kubeconfig {
            Some(path) if path.exists() || config.api_server.is_none() => {
                let kubeconfig = Kubeconfig::read(path)?;
                let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
                kubeconfig.resolve(config.context.as_deref(), base_dir)?
            }
            _ => RestConfig::default(),
        };

        if let Some(server) = &config.api_server {
            rest.server = server.trim_end_matches('/').to_string();
        }
        if let Some(token) = &config.token {
            rest.token = Some(token.clone());
        }
        if config.insecure {
            rest.insecure = true;
        }

        if rest.server.is_empty() {
            return Err(CheckError::ClientInit("no Kubernetes API server configured".to_string()));
        }

        Ok(rest)
    }
}

/// Inline base64 data wins over a file path.
fn pem_source(data: Option<&str>, path: Option<&Path>, base_dir: &Path) -> Result<Option<Vec<u8>>> {
    if let Some(data) = data {
        return BASE64
            .decode(data.trim())
            .map(Some)
            .map_err(|e| CheckError::ClientInit(format!("invalid base64 certificate data: {}", e)));
    }
    match path {
        Some(path) => read_file(&base_dir.join(path)).map(Some),
        None => Ok(None),
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path)
        .map_err(|e| CheckError::ClientInit(format!("failed to read {}: {}", path.display(), e)))
}

//! Cluster endpoint and credentials

use anyhow::Context as _;
use std::{fmt, path::Path};

/// Where service account token is mounted inside a pod
pub const SERVICE_ACCOUNT_TOKEN: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub cluster_url: String,
    /// Bearer token
    pub token: String,
    /// DER-encoded certificates trusted in addition to the system roots.
    /// In cluster this is the cluster CA.
    pub root_cert: Option<Vec<Vec<u8>>>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("cluster_url", &self.cluster_url)
            .field("token", &"<redacted>")
            .field("root_certs", &self.root_cert.as_ref().map_or(0, Vec::len))
            .finish()
    }
}

impl Credentials {
    pub fn new(cluster_url: &str, token: &str) -> Self {
        Credentials {
            cluster_url: cluster_url.to_string(),
            token: token.to_string(),
            root_cert: None,
        }
    }

    /// Reads `CLUSTER_URL` and `TOKEN` environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let cluster_url = std::env::var("CLUSTER_URL").context("CLUSTER_URL is not set")?;
        let token = std::env::var("TOKEN").context("TOKEN is not set")?;
        Ok(Self::new(&cluster_url, &token))
    }

    /// Uses pod's service account. Only works in cluster.
    pub fn in_cluster() -> anyhow::Result<Self> {
        let config = kube::Config::incluster().context("failed to load in-cluster config")?;
        let token = read_token(Path::new(SERVICE_ACCOUNT_TOKEN))?;
        Ok(Self::from_kube_config(&config, &token))
    }

    /// Takes endpoint and trusted certificates from `config`. Authentication
    /// configured in `config` is ignored in favor of `token`.
    pub fn from_kube_config(config: &kube::Config, token: &str) -> Self {
        Credentials {
            cluster_url: config.cluster_url.to_string(),
            token: token.to_string(),
            root_cert: config.root_cert.clone(),
        }
    }
}

/// Reads token file, stripping surrounding whitespace.
pub fn read_token(path: &Path) -> anyhow::Result<String> {
    let token = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read token from {}", path.display()))?;
    let token = token.trim();
    if token.is_empty() {
        anyhow::bail!("token file {} is empty", path.display());
    }
    Ok(token.to_string())
}

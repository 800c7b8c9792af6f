// ABOUTME: YAML configuration file model for the callback service.
// ABOUTME: Declares the listen address, the user directory and the cluster directory.

use crate::directory::{ClusterRecord, UserRecord};
use crate::error::{LoadError, Result};
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_LISTEN: &str = ":8080";

/// Top-level configuration file.
///
/// ```yaml
/// listen: ":8080"
/// clusters:
///   - name: prod
///     host: https://10.0.0.1:6443
///     cacertFile: /etc/sshhook/prod/ca.crt
///     certFile: /etc/sshhook/prod/client.crt
///     keyFile: /etc/sshhook/prod/client.key
/// users:
///   - username: alice
///     password: s3cret
///     metadata:
///       KUBERNETES_CLUSTER: prod
///       KUBERNETES_POD_NAMESPACE: default
///       KUBERNETES_POD_NAME: shell-pod
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Listen address. Go-style `:port` binds all interfaces.
    #[serde(default)]
    pub listen: String,

    #[serde(default)]
    pub clusters: Vec<ClusterRecord>,

    #[serde(default)]
    pub users: Vec<UserRecord>,
}

impl Config {
    /// Read and parse a config file. An empty or missing `listen` falls back
    /// to [`DEFAULT_LISTEN`].
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| LoadError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut config: Config =
            serde_yaml::from_str(&contents).map_err(|e| LoadError::Parse {
                path: path.to_path_buf(),
                source: e,
            })?;

        if config.listen.trim().is_empty() {
            config.listen = DEFAULT_LISTEN.to_string();
        }

        Ok(config)
    }

    /// The listen address in a form a socket can bind.
    pub fn listen_addr(&self) -> String {
        normalize_listen(&self.listen)
    }
}

/// Expand Go-style `:port` to `0.0.0.0:port`; anything else passes through.
pub fn normalize_listen(listen: &str) -> String {
    let listen = listen.trim();
    if listen.is_empty() {
        normalize_listen(DEFAULT_LISTEN)
    } else if listen.starts_with(':') {
        format!("0.0.0.0{listen}")
    } else {
        listen.to_string()
    }
}

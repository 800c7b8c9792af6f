// ABOUTME: Read-only in-memory directory of users and clusters.
// ABOUTME: Built once from configuration, then shared by every request handler.

use crate::error::{LoadError, Result};
use serde::Deserialize;
use sshhook_keys::AuthorizedKey;
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// A user that may authenticate through the gateway.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub username: String,

    /// Plaintext password, compared verbatim.
    #[serde(default)]
    pub password: String,

    /// Single authorized-key line. `None` disables public-key auth.
    #[serde(default)]
    pub public_key: Option<String>,

    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl std::fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRecord")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("public_key", &self.public_key)
            .field("metadata", &self.metadata)
            .finish()
    }
}

/// Connection parameters for a Kubernetes API server.
///
/// Optional fields that are empty strings or zero are normalized to `None`
/// when the directory is built, so they never reach a backend target.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClusterRecord {
    pub name: String,

    #[serde(rename = "host", default)]
    pub api_host: String,

    #[serde(rename = "cacertFile", default)]
    pub ca_cert_path: String,

    #[serde(rename = "certFile", default)]
    pub cert_path: String,

    #[serde(rename = "keyFile", default)]
    pub key_path: String,

    #[serde(rename = "bearerTokenFile", default)]
    pub bearer_token_file_path: Option<String>,

    #[serde(rename = "serverName", default)]
    pub tls_server_name: Option<String>,

    #[serde(default)]
    pub qps: Option<u32>,

    #[serde(default)]
    pub burst: Option<u32>,
}

impl ClusterRecord {
    fn normalized(mut self) -> Self {
        self.bearer_token_file_path = self.bearer_token_file_path.filter(|p| !p.is_empty());
        self.tls_server_name = self.tls_server_name.filter(|n| !n.is_empty());
        self.qps = self.qps.filter(|&q| q > 0);
        self.burst = self.burst.filter(|&b| b > 0);
        self
    }
}

/// Users keyed by username and clusters keyed by name. Lookups are exact and
/// case-sensitive. Never mutated after [`Directory::build`].
#[derive(Debug, Default)]
pub struct Directory {
    users: HashMap<String, UserRecord>,
    clusters: HashMap<String, ClusterRecord>,
}

impl Directory {
    /// Build the directory, rejecting empty or duplicate keys.
    ///
    /// A configured public key that does not parse is only warned about: the
    /// user can still log in with a password, and public-key attempts are
    /// rejected.
    pub fn build(users: Vec<UserRecord>, clusters: Vec<ClusterRecord>) -> Result<Self> {
        let mut user_map = HashMap::with_capacity(users.len());
        for (index, mut user) in users.into_iter().enumerate() {
            if user.username.is_empty() {
                return Err(LoadError::EmptyUsername { index });
            }
            user.public_key = user.public_key.filter(|k| !k.trim().is_empty());
            if let Some(key) = &user.public_key {
                if let Err(error) = AuthorizedKey::parse(key) {
                    warn!(username = %user.username, %error, "Configured public key does not parse");
                }
            }
            if user_map.contains_key(&user.username) {
                return Err(LoadError::DuplicateUser(user.username));
            }
            user_map.insert(user.username.clone(), user);
        }

        let mut cluster_map = HashMap::with_capacity(clusters.len());
        for (index, cluster) in clusters.into_iter().enumerate() {
            if cluster.name.is_empty() {
                return Err(LoadError::EmptyClusterName { index });
            }
            if cluster_map.contains_key(&cluster.name) {
                return Err(LoadError::DuplicateCluster(cluster.name));
            }
            cluster_map.insert(cluster.name.clone(), cluster.normalized());
        }

        Ok(Self {
            users: user_map,
            clusters: cluster_map,
        })
    }

    pub fn find_user(&self, username: &str) -> Option<&UserRecord> {
        self.users.get(username)
    }

    pub fn find_cluster(&self, name: &str) -> Option<&ClusterRecord> {
        self.clusters.get(name)
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }
}

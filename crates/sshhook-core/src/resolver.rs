// ABOUTME: Derives the Kubernetes pod/container target for an authenticated user.
// ABOUTME: Pure lookup over user metadata and the cluster directory; no I/O, no retries.

use crate::directory::{ClusterRecord, Directory};
use crate::error::ResolveError;
use crate::validator::AuthDecision;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Metadata key naming the cluster record to connect through.
pub const CLUSTER_NAME_KEY: &str = "KUBERNETES_CLUSTER";
pub const POD_NAMESPACE_KEY: &str = "KUBERNETES_POD_NAMESPACE";
pub const POD_NAME_KEY: &str = "KUBERNETES_POD_NAME";
/// Optional. Unset or empty selects the pod's first container.
pub const CONTAINER_NAME_KEY: &str = "KUBERNETES_CONTAINER_NAME";

/// Where an authenticated session is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendTarget {
    pub cluster: ClusterRecord,
    pub namespace: String,
    pub pod_name: String,
    pub container_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Resolver {
    directory: Arc<Directory>,
}

impl Resolver {
    pub fn new(directory: Arc<Directory>) -> Self {
        Self { directory }
    }

    /// Resolve the target for an accepted decision.
    pub fn resolve(&self, decision: &AuthDecision) -> Result<BackendTarget, ResolveError> {
        let AuthDecision::Accepted { identity, metadata } = decision else {
            return Err(ResolveError::NotAuthenticated);
        };

        let cluster_name = non_empty(metadata, CLUSTER_NAME_KEY)
            .ok_or_else(|| ResolveError::MissingClusterName(identity.clone()))?;

        let cluster = self
            .directory
            .find_cluster(cluster_name)
            .ok_or_else(|| ResolveError::ClusterNotFound(cluster_name.to_string()))?;

        let (Some(namespace), Some(pod_name)) = (
            non_empty(metadata, POD_NAMESPACE_KEY),
            non_empty(metadata, POD_NAME_KEY),
        ) else {
            return Err(ResolveError::MissingPodSpec(identity.clone()));
        };

        Ok(BackendTarget {
            cluster: cluster.clone(),
            namespace: namespace.to_string(),
            pod_name: pod_name.to_string(),
            container_name: non_empty(metadata, CONTAINER_NAME_KEY).map(str::to_string),
        })
    }

    /// Resolve the target for a username the gateway has already authenticated.
    pub fn resolve_user(&self, username: &str) -> Result<BackendTarget, ResolveError> {
        let user = self
            .directory
            .find_user(username)
            .ok_or_else(|| ResolveError::UnknownUser(username.to_string()))?;

        self.resolve(&AuthDecision::accept(user))
    }
}

fn non_empty<'a>(metadata: &'a BTreeMap<String, String>, key: &str) -> Option<&'a str> {
    metadata
        .get(key)
        .map(String::as_str)
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::UserRecord;

    fn prod() -> ClusterRecord {
        ClusterRecord {
            name: "prod".to_string(),
            api_host: "https://10.0.0.1:6443".to_string(),
            ca_cert_path: "/certs/ca.crt".to_string(),
            cert_path: "/certs/client.crt".to_string(),
            key_path: "/certs/client.key".to_string(),
            bearer_token_file_path: None,
            tls_server_name: None,
            qps: None,
            burst: None,
        }
    }

    fn accepted(entries: &[(&str, &str)]) -> AuthDecision {
        AuthDecision::Accepted {
            identity: "alice".to_string(),
            metadata: entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    fn resolver() -> Resolver {
        let alice = UserRecord {
            username: "alice".to_string(),
            password: "s3cret".to_string(),
            public_key: None,
            metadata: BTreeMap::from([
                (CLUSTER_NAME_KEY.to_string(), "prod".to_string()),
                (POD_NAMESPACE_KEY.to_string(), "default".to_string()),
                (POD_NAME_KEY.to_string(), "shell-pod".to_string()),
            ]),
        };
        let directory = Directory::build(vec![alice], vec![prod()]).unwrap();
        Resolver::new(Arc::new(directory))
    }

    #[test]
    fn test_resolve_full_target() {
        let target = resolver()
            .resolve(&accepted(&[
                (CLUSTER_NAME_KEY, "prod"),
                (POD_NAMESPACE_KEY, "default"),
                (POD_NAME_KEY, "shell-pod"),
                (CONTAINER_NAME_KEY, "shell"),
            ]))
            .expect("should resolve");

        assert_eq!(target.cluster, prod());
        assert_eq!(target.namespace, "default");
        assert_eq!(target.pod_name, "shell-pod");
        assert_eq!(target.container_name.as_deref(), Some("shell"));
    }

    #[test]
    fn test_resolve_user_scenario() {
        let target = resolver().resolve_user("alice").expect("should resolve");
        assert_eq!(
            target,
            BackendTarget {
                cluster: prod(),
                namespace: "default".to_string(),
                pod_name: "shell-pod".to_string(),
                container_name: None,
            }
        );
    }

    #[test]
    fn test_empty_container_is_unset() {
        let target = resolver()
            .resolve(&accepted(&[
                (CLUSTER_NAME_KEY, "prod"),
                (POD_NAMESPACE_KEY, "default"),
                (POD_NAME_KEY, "shell-pod"),
                (CONTAINER_NAME_KEY, ""),
            ]))
            .unwrap();
        assert_eq!(target.container_name, None);
    }

    #[test]
    fn test_missing_cluster_name() {
        let result = resolver().resolve(&accepted(&[
            (POD_NAMESPACE_KEY, "default"),
            (POD_NAME_KEY, "shell-pod"),
        ]));
        assert_eq!(
            result,
            Err(ResolveError::MissingClusterName("alice".to_string()))
        );

        let result = resolver().resolve(&accepted(&[
            (CLUSTER_NAME_KEY, ""),
            (POD_NAMESPACE_KEY, "default"),
            (POD_NAME_KEY, "shell-pod"),
        ]));
        assert_eq!(
            result,
            Err(ResolveError::MissingClusterName("alice".to_string()))
        );
    }

    #[test]
    fn test_cluster_not_found() {
        let result = resolver().resolve(&accepted(&[
            (CLUSTER_NAME_KEY, "staging"),
            (POD_NAMESPACE_KEY, "default"),
            (POD_NAME_KEY, "shell-pod"),
        ]));
        assert_eq!(
            result,
            Err(ResolveError::ClusterNotFound("staging".to_string()))
        );
    }

    #[test]
    fn test_cluster_lookup_is_case_sensitive() {
        let result = resolver().resolve(&accepted(&[
            (CLUSTER_NAME_KEY, "Prod"),
            (POD_NAMESPACE_KEY, "default"),
            (POD_NAME_KEY, "shell-pod"),
        ]));
        assert!(matches!(result, Err(ResolveError::ClusterNotFound(_))));
    }

    #[test]
    fn test_missing_pod_spec() {
        let resolver = resolver();
        for entries in [
            vec![(CLUSTER_NAME_KEY, "prod"), (POD_NAME_KEY, "shell-pod")],
            vec![(CLUSTER_NAME_KEY, "prod"), (POD_NAMESPACE_KEY, "default")],
            vec![
                (CLUSTER_NAME_KEY, "prod"),
                (POD_NAMESPACE_KEY, ""),
                (POD_NAME_KEY, "shell-pod"),
            ],
        ] {
            assert_eq!(
                resolver.resolve(&accepted(&entries)),
                Err(ResolveError::MissingPodSpec("alice".to_string()))
            );
        }
    }

    #[test]
    fn test_cluster_checked_before_pod_spec() {
        let result = resolver().resolve(&accepted(&[(CLUSTER_NAME_KEY, "staging")]));
        assert_eq!(
            result,
            Err(ResolveError::ClusterNotFound("staging".to_string()))
        );
    }

    #[test]
    fn test_rejected_decision() {
        assert_eq!(
            resolver().resolve(&AuthDecision::Rejected),
            Err(ResolveError::NotAuthenticated)
        );
    }

    #[test]
    fn test_resolve_unknown_user() {
        assert_eq!(
            resolver().resolve_user("mallory"),
            Err(ResolveError::UnknownUser("mallory".to_string()))
        );
    }
}

// ABOUTME: JSON request and response bodies of the ContainerSSH webhook protocol.
// ABOUTME: Plain serde records; field names follow the gateway's camelCase schema.

use serde::{Deserialize, Serialize};
use sshhook_core::BackendTarget;
use std::collections::BTreeMap;

/// Backend type emitted in every config response.
pub const BACKEND_KUBERNETES: &str = "kubernetes";

/// Shell started in the target container.
pub const DEFAULT_SHELL: &str = "/bin/bash";

/// A string metadata entry as the gateway transports it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataValue {
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub sensitive: bool,
}

impl MetadataValue {
    pub fn plain(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            sensitive: false,
        }
    }
}

/// A file entry; `value` is Base64-encoded content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryValue {
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub sensitive: bool,
}

/// Connection metadata shared by every callback body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectionMetadata {
    pub username: String,
    pub remote_address: String,
    pub connection_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub client_version: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, MetadataValue>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, MetadataValue>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub files: BTreeMap<String, BinaryValue>,
}

impl ConnectionMetadata {
    /// Identifiers only, without any metadata, environment or files.
    pub fn identifiers(&self) -> Self {
        Self {
            username: self.username.clone(),
            remote_address: self.remote_address.clone(),
            connection_id: self.connection_id.clone(),
            client_version: self.client_version.clone(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordAuthRequest {
    #[serde(flatten)]
    pub connection: ConnectionMetadata,
    #[serde(default)]
    pub password_base64: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyAuthRequest {
    #[serde(flatten)]
    pub connection: ConnectionMetadata,
    /// Authorized-key text, e.g. `ssh-ed25519 AAAA...`.
    #[serde(default)]
    pub public_key: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigRequest {
    #[serde(flatten)]
    pub connection: ConnectionMetadata,
    #[serde(default)]
    pub authenticated_username: String,
}

/// Answer to `/password` and `/pubkey`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(flatten)]
    pub connection: ConnectionMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authenticated_username: Option<String>,
    pub success: bool,
}

impl AuthResponse {
    pub fn rejected(request: &ConnectionMetadata) -> Self {
        Self {
            connection: request.identifiers(),
            authenticated_username: None,
            success: false,
        }
    }

    /// Successful answer carrying the user's metadata, never marked sensitive.
    pub fn accepted(
        request: &ConnectionMetadata,
        identity: &str,
        metadata: &BTreeMap<String, String>,
    ) -> Self {
        let mut connection = request.identifiers();
        connection.metadata = metadata
            .iter()
            .map(|(key, value)| (key.clone(), MetadataValue::plain(value.clone())))
            .collect();

        Self {
            connection,
            authenticated_username: Some(identity.to_string()),
            success: true,
        }
    }
}

/// Answer to `/config`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigResponse {
    #[serde(flatten)]
    pub connection: ConnectionMetadata,
    #[serde(default)]
    pub authenticated_username: String,
    pub config: AppConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub backend: String,
    pub kubernetes: KubernetesConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KubernetesConfig {
    pub connection: KubernetesConnection,
    pub pod: KubernetesPod,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KubernetesConnection {
    pub host: String,
    #[serde(rename = "cacertFile")]
    pub ca_file: String,
    pub cert_file: String,
    pub key_file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearer_token_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qps: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub burst: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KubernetesPod {
    pub metadata: PodMetadata,
    #[serde(default, skip_serializing_if = "PodSpec::is_empty")]
    pub spec: PodSpec,
    pub console_container_number: u32,
    pub shell_command: Vec<String>,
    pub disable_agent: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodMetadata {
    pub name: String,
    pub namespace: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub containers: Vec<Container>,
}

impl PodSpec {
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub name: String,
}

impl From<&BackendTarget> for AppConfig {
    fn from(target: &BackendTarget) -> Self {
        let cluster = &target.cluster;
        let connection = KubernetesConnection {
            host: cluster.api_host.clone(),
            ca_file: cluster.ca_cert_path.clone(),
            cert_file: cluster.cert_path.clone(),
            key_file: cluster.key_path.clone(),
            bearer_token_file: cluster.bearer_token_file_path.clone(),
            server_name: cluster.tls_server_name.clone(),
            qps: cluster.qps.map(|qps| qps as f32),
            burst: cluster.burst,
        };

        // The gateway execs into containers[consoleContainerNumber].
        let containers = target
            .container_name
            .iter()
            .map(|name| Container { name: name.clone() })
            .collect();

        let pod = KubernetesPod {
            metadata: PodMetadata {
                name: target.pod_name.clone(),
                namespace: target.namespace.clone(),
            },
            spec: PodSpec { containers },
            console_container_number: 0,
            shell_command: vec![DEFAULT_SHELL.to_string()],
            disable_agent: true,
        };

        Self {
            backend: BACKEND_KUBERNETES.to_string(),
            kubernetes: KubernetesConfig { connection, pod },
        }
    }
}

/// Body of `GET /healthz`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub users: usize,
    pub clusters: usize,
}

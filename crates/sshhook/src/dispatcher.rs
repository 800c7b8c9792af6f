// ABOUTME: Callback dispatcher mapping webhook requests onto the validator and resolver.
// ABOUTME: Owns the axum router; all dependencies arrive through the constructor.

use crate::wire::{
    AppConfig, AuthResponse, ConfigRequest, ConfigResponse, HealthResponse, PasswordAuthRequest,
    PublicKeyAuthRequest,
};
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::DeserializeOwned;
use sshhook_core::{AuthDecision, ResolveError, Resolver, Validator};
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Upper bound for a callback body.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Answers the three gateway callbacks.
///
/// Cloning is cheap: the validator and resolver share one `Arc<Directory>`.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    validator: Validator,
    resolver: Resolver,
}

impl Dispatcher {
    pub fn new(validator: Validator, resolver: Resolver) -> Self {
        Self {
            validator,
            resolver,
        }
    }

    /// Routes: `POST /password`, `POST /pubkey`, `POST /config`, `GET /healthz`.
    pub fn router(self) -> Router {
        Router::new()
            .route("/password", post(password_auth))
            .route("/pubkey", post(public_key_auth))
            .route("/config", post(config))
            .route("/healthz", get(healthz))
            .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
            .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
            .layer(TraceLayer::new_for_http())
            .with_state(self)
    }

    /// Handle a password callback. A password that is not valid Base64 is
    /// answered exactly like a wrong one.
    pub fn password(&self, request: &PasswordAuthRequest) -> AuthResponse {
        let connection = &request.connection;
        info!(
            username = %connection.username,
            remote_address = %connection.remote_address,
            connection_id = %connection.connection_id,
            "Password auth request received"
        );

        let password = match STANDARD.decode(request.password_base64.as_bytes()) {
            Ok(password) => password,
            Err(error) => {
                warn!(username = %connection.username, %error, "Failed to decode password");
                return AuthResponse::rejected(connection);
            }
        };

        let decision = self
            .validator
            .validate_password(&connection.username, &password);
        respond(connection, decision, "Password")
    }

    /// Handle a public-key callback.
    pub fn public_key(&self, request: &PublicKeyAuthRequest) -> AuthResponse {
        let connection = &request.connection;
        info!(
            username = %connection.username,
            remote_address = %connection.remote_address,
            connection_id = %connection.connection_id,
            "Public key auth request received"
        );

        let decision = self
            .validator
            .validate_public_key(&connection.username, &request.public_key);
        respond(connection, decision, "Public key")
    }

    /// Handle a config callback for an already-authenticated connection.
    pub fn config(&self, request: &ConfigRequest) -> Result<ConfigResponse, ResolveError> {
        let username = &request.authenticated_username;
        info!(
            username = %request.connection.username,
            authenticated_username = %username,
            connection_id = %request.connection.connection_id,
            "Config request received"
        );

        let target = self.resolver.resolve_user(username).inspect_err(|error| {
            warn!(%username, %error, "Failed to resolve backend target");
        })?;

        info!(
            cluster = %target.cluster.name,
            namespace = %target.namespace,
            pod = %target.pod_name,
            container = target.container_name.as_deref().unwrap_or(""),
            "Configuration returned"
        );

        Ok(ConfigResponse {
            connection: request.connection.clone(),
            authenticated_username: username.clone(),
            config: AppConfig::from(&target),
        })
    }

    pub fn health(&self) -> HealthResponse {
        let directory = self.validator.directory();
        HealthResponse {
            status: "ok".to_string(),
            users: directory.user_count(),
            clusters: directory.cluster_count(),
        }
    }
}

fn respond(
    connection: &crate::wire::ConnectionMetadata,
    decision: AuthDecision,
    method: &str,
) -> AuthResponse {
    match decision {
        AuthDecision::Accepted { identity, metadata } => {
            info!(username = %identity, method, "Authentication successful");
            AuthResponse::accepted(connection, &identity, &metadata)
        }
        AuthDecision::Rejected => AuthResponse::rejected(connection),
    }
}

/// HTTP status for a failed config callback.
pub fn resolve_status(error: &ResolveError) -> StatusCode {
    match error {
        ResolveError::UnknownUser(_) | ResolveError::ClusterNotFound(_) => StatusCode::NOT_FOUND,
        ResolveError::MissingClusterName(_) | ResolveError::MissingPodSpec(_) => {
            StatusCode::BAD_REQUEST
        }
        ResolveError::NotAuthenticated => StatusCode::FORBIDDEN,
    }
}

fn decode<T: DeserializeOwned>(body: &[u8], callback: &'static str) -> Result<T, Response> {
    serde_json::from_slice(body).map_err(|error| {
        warn!(%error, callback, "Failed to decode request");
        (StatusCode::BAD_REQUEST, "Bad request").into_response()
    })
}

async fn password_auth(State(dispatcher): State<Dispatcher>, body: Bytes) -> Response {
    match decode::<PasswordAuthRequest>(&body, "password") {
        Ok(request) => Json(dispatcher.password(&request)).into_response(),
        Err(response) => response,
    }
}

async fn public_key_auth(State(dispatcher): State<Dispatcher>, body: Bytes) -> Response {
    match decode::<PublicKeyAuthRequest>(&body, "pubkey") {
        Ok(request) => Json(dispatcher.public_key(&request)).into_response(),
        Err(response) => response,
    }
}

async fn config(State(dispatcher): State<Dispatcher>, body: Bytes) -> Response {
    let request = match decode::<ConfigRequest>(&body, "config") {
        Ok(request) => request,
        Err(response) => return response,
    };

    match dispatcher.config(&request) {
        Ok(response) => Json(response).into_response(),
        Err(error) => (resolve_status(&error), error.to_string()).into_response(),
    }
}

async fn healthz(State(dispatcher): State<Dispatcher>) -> Json<HealthResponse> {
    Json(dispatcher.health())
}

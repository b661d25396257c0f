use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Failures of the token → secret → connection string flow.
///
/// Variant payloads are for logs only. What reaches the page is
/// [`VaultError::user_message`], which is a fixed string per kind.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("managed identity unavailable: {0}")]
    IdentityUnavailable(String),

    #[error("secret store transport failure: {0}")]
    TransportFailure(String),

    #[error("secret store denied access (status {status})")]
    AuthorizationDenied { status: u16 },

    #[error("secret not found: {name}")]
    SecretNotFound { name: String },

    #[error("malformed secret identifier: {0}")]
    MalformedSecretUri(String),

    #[error("configuration missing: {0}")]
    ConfigurationMissing(&'static str),
}

impl VaultError {
    /// Short machine name, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            VaultError::IdentityUnavailable(_) => "identity_unavailable",
            VaultError::TransportFailure(_) => "transport_failure",
            VaultError::AuthorizationDenied { .. } => "authorization_denied",
            VaultError::SecretNotFound { .. } => "secret_not_found",
            VaultError::MalformedSecretUri(_) => "malformed_secret_uri",
            VaultError::ConfigurationMissing(_) => "configuration_missing",
        }
    }

    /// Generic text safe to show an end user. Never includes upstream
    /// response bodies, URIs or secret material.
    pub fn user_message(&self) -> String {
        match self {
            VaultError::IdentityUnavailable(_) => "managed identity is unavailable".to_string(),
            VaultError::TransportFailure(_) => "secret store could not be reached".to_string(),
            VaultError::AuthorizationDenied { .. } => "access to the secret was denied".to_string(),
            VaultError::SecretNotFound { .. } => "secret was not found".to_string(),
            VaultError::MalformedSecretUri(_) => "secret identifier is malformed".to_string(),
            VaultError::ConfigurationMissing(name) => {
                format!("required setting '{}' is missing", name)
            }
        }
    }
}

/// HTTP-level failures outside the secret flow. The secret page itself
/// never returns one of these; it always renders.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found")]
    NotFound,

    #[error("not ready: {0}")]
    NotReady(&'static str),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, code, msg) = match &self {
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                "invalid_request_error",
                "not_found",
                "no such route".to_string(),
            ),
            AppError::NotReady(reason) => {
                tracing::warn!("Readiness check failed: {}", reason);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "unavailable_error",
                    "not_ready",
                    reason.to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "message": msg,
                "type": error_type,
                "code": code,
            }
        }));

        (status, body).into_response()
    }
}

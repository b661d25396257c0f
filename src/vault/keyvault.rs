use async_trait::async_trait;
use serde::Deserialize;

use super::{FetchReport, SecretRef, SecretStore};
use crate::config::Config;
use crate::errors::VaultError;
use crate::http::truncate_for_log;
use crate::identity::{AccessToken, TokenSupplier};
use crate::models::secret::SecretValue;

/// Key Vault REST client for single secret reads.
#[derive(Clone)]
pub struct KeyVaultClient {
    client: reqwest::Client,
    api_version: String,
}

#[derive(Deserialize)]
struct SecretBundle {
    value: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    code: Option<String>,
}

impl KeyVaultClient {
    pub fn new(client: reqwest::Client, api_version: impl Into<String>) -> Self {
        Self {
            client,
            api_version: api_version.into(),
        }
    }

    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let client = crate::http::build_client(cfg.connect_timeout())?;
        Ok(Self::new(client, cfg.api_version.clone()))
    }

    async fn read(&self, secret: &SecretRef, token: &AccessToken) -> Result<SecretValue, VaultError> {
        let resp = self
            .client
            .get(secret.request_url(&self.api_version))
            .bearer_auth(token.secret())
            .send()
            .await
            .map_err(|e| VaultError::TransportFailure(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let code = serde_json::from_str::<ErrorEnvelope>(&body)
                .ok()
                .and_then(|e| e.error.code);
            tracing::debug!(
                status = status.as_u16(),
                code = code.as_deref().unwrap_or(""),
                body = truncate_for_log(&body, 256),
                "Key Vault rejected secret read"
            );
            return Err(match status.as_u16() {
                401 | 403 => VaultError::AuthorizationDenied {
                    status: status.as_u16(),
                },
                404 => VaultError::SecretNotFound {
                    name: secret.name().to_string(),
                },
                _ => VaultError::TransportFailure(format!("secret store returned {}", status)),
            });
        }

        let bundle: SecretBundle = resp
            .json()
            .await
            .map_err(|e| VaultError::TransportFailure(format!("unreadable secret bundle: {}", e)))?;

        bundle
            .value
            .map(SecretValue::new)
            .ok_or_else(|| VaultError::TransportFailure("secret bundle carried no value".into()))
    }
}

#[async_trait]
impl SecretStore for KeyVaultClient {
    async fn fetch_secret(&self, secret: &SecretRef, tokens: &dyn TokenSupplier) -> FetchReport {
        let token = match tokens.supply_token(secret.audience()).await {
            Ok(t) => t,
            Err(e) => return FetchReport::failed(e),
        };

        let principal = token.principal.clone();
        let outcome = self.read(secret, &token).await;

        match &outcome {
            Ok(_) => tracing::info!(secret_id = %secret, "Read secret from Key Vault"),
            Err(e) => tracing::debug!(secret_id = %secret, kind = e.kind(), "Key Vault read failed: {}", e),
        }

        FetchReport { principal, outcome }
    }
}

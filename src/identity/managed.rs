use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

use super::{AccessToken, IdentitySource, PrincipalInfo, TokenSupplier};
use crate::config::Config;
use crate::errors::VaultError;
use crate::http::truncate_for_log;

const APP_SERVICE_API_VERSION: &str = "2019-08-01";
const LEGACY_APP_SERVICE_API_VERSION: &str = "2017-09-01";
const IMDS_API_VERSION: &str = "2018-02-01";

/// Token supplier backed by the hosting platform's managed identity.
///
/// Holds no token state between calls: every `supply_token` asks the
/// identity endpoint again and returns the principal alongside the token.
#[derive(Clone)]
pub struct ManagedIdentityCredential {
    client: reqwest::Client,
    source: IdentitySource,
    client_id: Option<String>,
}

/// OAuth token reply. `expires_on` is a number on IMDS and a numeric
/// string on App Service.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_on: Option<serde_json::Value>,
    #[serde(default)]
    client_id: Option<String>,
}

impl ManagedIdentityCredential {
    pub fn new(client: reqwest::Client, source: IdentitySource, client_id: Option<String>) -> Self {
        Self {
            client,
            source,
            client_id,
        }
    }

    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let client = crate::http::build_client(cfg.connect_timeout())?;
        Ok(Self::new(client, cfg.identity.clone(), cfg.client_id.clone()))
    }

    pub fn source(&self) -> &IdentitySource {
        &self.source
    }

    fn request(&self, resource: &str) -> reqwest::RequestBuilder {
        let mut query: Vec<(&str, &str)> = vec![("resource", resource)];
        let req = match &self.source {
            IdentitySource::AppService { endpoint, header } => {
                query.push(("api-version", APP_SERVICE_API_VERSION));
                if let Some(id) = &self.client_id {
                    query.push(("client_id", id.as_str()));
                }
                self.client
                    .get(endpoint)
                    .header("X-IDENTITY-HEADER", header)
            }
            IdentitySource::LegacyAppService { endpoint, secret } => {
                query.push(("api-version", LEGACY_APP_SERVICE_API_VERSION));
                if let Some(id) = &self.client_id {
                    query.push(("clientid", id.as_str()));
                }
                self.client.get(endpoint).header("Secret", secret)
            }
            IdentitySource::Imds { endpoint } => {
                query.push(("api-version", IMDS_API_VERSION));
                if let Some(id) = &self.client_id {
                    query.push(("client_id", id.as_str()));
                }
                self.client.get(endpoint).header("Metadata", "true")
            }
        };
        req.query(&query)
    }
}

#[async_trait]
impl TokenSupplier for ManagedIdentityCredential {
    async fn supply_token(&self, resource: &str) -> Result<AccessToken, VaultError> {
        tracing::debug!(source = self.source.name(), resource = %resource, "Requesting managed identity token");

        let resp = self.request(resource).send().await.map_err(|e| {
            tracing::debug!(source = self.source.name(), "Identity endpoint unreachable: {}", e);
            VaultError::IdentityUnavailable(format!("identity endpoint unreachable: {}", e))
        })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::debug!(
                status = status.as_u16(),
                body = truncate_for_log(&body, 256),
                "Identity endpoint rejected token request"
            );
            return Err(VaultError::IdentityUnavailable(format!(
                "identity endpoint returned {}",
                status
            )));
        }

        let parsed: TokenResponse = resp.json().await.map_err(|e| {
            VaultError::IdentityUnavailable(format!("unreadable token response: {}", e))
        })?;

        // A token was issued, so some principal was used even if nothing
        // names it.
        let principal = PrincipalInfo::from_jwt(&parsed.access_token)
            .or_else(|| {
                parsed
                    .client_id
                    .as_deref()
                    .or(self.client_id.as_deref())
                    .map(PrincipalInfo::from_client_id)
            })
            .unwrap_or_else(PrincipalInfo::unidentified);
        let expires_on = parsed.expires_on.as_ref().and_then(parse_expires_on);

        tracing::info!(
            source = self.source.name(),
            principal = %principal,
            "Acquired managed identity token"
        );

        Ok(AccessToken::new(parsed.access_token)
            .with_expiry(expires_on)
            .with_principal(Some(principal)))
    }
}

fn parse_expires_on(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    let secs = match value {
        serde_json::Value::Number(n) => n.as_i64()?,
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    Utc.timestamp_opt(secs, 0).single()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_imds_request_shape() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/metadata/identity/oauth2/token"))
            .and(header("Metadata", "true"))
            .and(query_param("api-version", "2018-02-01"))
            .and(query_param("resource", "https://vault.azure.net"))
            .and(query_param("client_id", "user-assigned-id"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "opaque",
                "expires_on": 1700000000,
                "token_type": "Bearer",
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let cred = ManagedIdentityCredential::new(
            reqwest::Client::new(),
            IdentitySource::Imds {
                endpoint: format!("{}/metadata/identity/oauth2/token", mock_server.uri()),
            },
            Some("user-assigned-id".into()),
        );

        let token = cred.supply_token("https://vault.azure.net").await.unwrap();
        assert_eq!(token.secret(), "opaque");
        assert_eq!(token.expires_on.unwrap().timestamp(), 1700000000);
        // Not a JWT, so the configured client id is what we know.
        assert_eq!(
            token.principal.unwrap().app_id.as_deref(),
            Some("user-assigned-id")
        );
    }

    #[tokio::test]
    async fn test_app_service_request_shape() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/msi/token"))
            .and(header("X-IDENTITY-HEADER", "hdr-value"))
            .and(query_param("api-version", "2019-08-01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "opaque",
                "expires_on": "1700000000",
                "client_id": "system-assigned-id",
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let cred = ManagedIdentityCredential::new(
            reqwest::Client::new(),
            IdentitySource::AppService {
                endpoint: format!("{}/msi/token", mock_server.uri()),
                header: "hdr-value".into(),
            },
            None,
        );

        let token = cred.supply_token("https://vault.azure.net").await.unwrap();
        assert_eq!(token.expires_on.unwrap().timestamp(), 1700000000);
        assert_eq!(
            token.principal.unwrap().app_id.as_deref(),
            Some("system-assigned-id")
        );
    }

    #[tokio::test]
    async fn test_legacy_request_uses_secret_header() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/legacy"))
            .and(header("Secret", "s3cr3t"))
            .and(query_param("api-version", "2017-09-01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "opaque",
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let cred = ManagedIdentityCredential::new(
            reqwest::Client::new(),
            IdentitySource::LegacyAppService {
                endpoint: format!("{}/legacy", mock_server.uri()),
                secret: "s3cr3t".into(),
            },
            None,
        );

        let token = cred.supply_token("https://vault.azure.net").await.unwrap();
        assert!(token.expires_on.is_none());
        // Opaque token, no client id anywhere: still reported as an app.
        assert_eq!(token.principal.unwrap(), PrincipalInfo::unidentified());
    }

    #[tokio::test]
    async fn test_identity_error_status_is_unavailable() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_string(r#"{"error":"invalid_request","error_description":"Identity not found"}"#),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let cred = ManagedIdentityCredential::new(
            reqwest::Client::new(),
            IdentitySource::Imds {
                endpoint: mock_server.uri(),
            },
            None,
        );

        let err = cred.supply_token("https://vault.azure.net").await.unwrap_err();
        assert!(matches!(err, VaultError::IdentityUnavailable(_)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_unavailable() {
        let cred = ManagedIdentityCredential::new(
            reqwest::Client::new(),
            IdentitySource::Imds {
                endpoint: "http://127.0.0.1:1/metadata/identity/oauth2/token".into(),
            },
            None,
        );

        let err = cred.supply_token("https://vault.azure.net").await.unwrap_err();
        assert!(matches!(err, VaultError::IdentityUnavailable(_)));
    }

    #[test]
    fn test_parse_expires_on_variants() {
        assert!(parse_expires_on(&serde_json::json!(1700000000)).is_some());
        assert!(parse_expires_on(&serde_json::json!("1700000000")).is_some());
        assert!(parse_expires_on(&serde_json::json!("09/14/2017 00:00:00 PM +00:00")).is_none());
        assert!(parse_expires_on(&serde_json::json!(null)).is_none());
    }
}

pub mod managed;
pub mod principal;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use zeroize::Zeroizing;

use crate::errors::VaultError;

pub use managed::ManagedIdentityCredential;
pub use principal::{PrincipalInfo, PrincipalKind};

/// Where the ambient identity service lives. Resolved once from the
/// environment at startup.
#[derive(Clone, PartialEq, Eq)]
pub enum IdentitySource {
    /// App Service / Functions (`IDENTITY_ENDPOINT` + `IDENTITY_HEADER`).
    AppService { endpoint: String, header: String },
    /// Older App Service sandboxes (`MSI_ENDPOINT` + `MSI_SECRET`).
    LegacyAppService { endpoint: String, secret: String },
    /// Azure instance metadata service.
    Imds { endpoint: String },
}

impl IdentitySource {
    pub fn name(&self) -> &'static str {
        match self {
            IdentitySource::AppService { .. } => "app_service",
            IdentitySource::LegacyAppService { .. } => "legacy_app_service",
            IdentitySource::Imds { .. } => "imds",
        }
    }
}

impl fmt::Debug for IdentitySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentitySource::AppService { endpoint, .. } => f
                .debug_struct("AppService")
                .field("endpoint", endpoint)
                .field("header", &"**redacted**")
                .finish(),
            IdentitySource::LegacyAppService { endpoint, .. } => f
                .debug_struct("LegacyAppService")
                .field("endpoint", endpoint)
                .field("secret", &"**redacted**")
                .finish(),
            IdentitySource::Imds { endpoint } => {
                f.debug_struct("Imds").field("endpoint", endpoint).finish()
            }
        }
    }
}

/// A bearer credential for one audience. Lives for a single request.
pub struct AccessToken {
    value: Zeroizing<String>,
    pub expires_on: Option<DateTime<Utc>>,
    pub principal: Option<PrincipalInfo>,
}

impl AccessToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: Zeroizing::new(value.into()),
            expires_on: None,
            principal: None,
        }
    }

    pub fn with_principal(mut self, principal: Option<PrincipalInfo>) -> Self {
        self.principal = principal;
        self
    }

    pub fn with_expiry(mut self, expires_on: Option<DateTime<Utc>>) -> Self {
        self.expires_on = expires_on;
        self
    }

    /// Raw bearer value, for the `Authorization` header only.
    pub fn secret(&self) -> &str {
        &self.value
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"**redacted**")
            .field("expires_on", &self.expires_on)
            .field("principal", &self.principal)
            .finish()
    }
}

/// Supplies a bearer token for `resource` on demand.
///
/// The secret fetcher calls this lazily, once per authenticated call,
/// never at construction time.
#[async_trait]
pub trait TokenSupplier: Send + Sync {
    async fn supply_token(&self, resource: &str) -> Result<AccessToken, VaultError>;
}

pub mod keyvault;
pub mod secret_ref;

use async_trait::async_trait;

use crate::errors::VaultError;
use crate::identity::{PrincipalInfo, TokenSupplier};
use crate::models::secret::SecretValue;

pub use keyvault::KeyVaultClient;
pub use secret_ref::SecretRef;

/// Result of one authenticated read.
///
/// `principal` is filled whenever a token was obtained, even if the read
/// itself failed afterwards.
#[derive(Debug)]
pub struct FetchReport {
    pub principal: Option<PrincipalInfo>,
    pub outcome: Result<SecretValue, VaultError>,
}

impl FetchReport {
    pub fn failed(err: VaultError) -> Self {
        Self {
            principal: None,
            outcome: Err(err),
        }
    }
}

/// Abstraction over the remote secret store.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Reads `secret` once, asking `tokens` for a bearer token only when
    /// the request is about to be sent.
    async fn fetch_secret(&self, secret: &SecretRef, tokens: &dyn TokenSupplier) -> FetchReport;
}

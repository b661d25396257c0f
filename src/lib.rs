//! Key Vault web app — library crate.
//!
//! Serves a page that obtains a managed identity token, reads one secret
//! (a Redis access key) from Key Vault, and optionally composes it into a
//! connection string. Modules are public so `tests/` can drive them.

use std::sync::Arc;

pub mod api;
pub mod compose;
pub mod config;
pub mod errors;
pub mod flow;
pub mod http;
pub mod identity;
pub mod models;
pub mod telemetry;
pub mod vault;

use identity::{ManagedIdentityCredential, TokenSupplier};
use vault::{KeyVaultClient, SecretStore};

/// Shared application state passed to handlers. Read-only after startup.
pub struct AppState {
    pub config: config::Config,
    pub store: Arc<dyn SecretStore>,
    pub tokens: Arc<dyn TokenSupplier>,
}

impl AppState {
    /// Wires the real Key Vault client and managed identity credential.
    pub fn from_config(config: config::Config) -> anyhow::Result<Self> {
        let tokens = ManagedIdentityCredential::from_config(&config)?;
        tracing::info!(source = tokens.source().name(), "Managed identity source resolved");
        let store = KeyVaultClient::from_config(&config)?;
        Ok(Self {
            config,
            store: Arc::new(store),
            tokens: Arc::new(tokens),
        })
    }
}

//! One pass of the secret page: token → secret → optional connection
//! string. Never retries, never caches, and always yields a model the
//! page can render.

use crate::compose::compose;
use crate::config::Config;
use crate::errors::VaultError;
use crate::identity::TokenSupplier;
use crate::models::render::RenderModel;
use crate::models::secret::{ConnectionString, SecretValue};
use crate::vault::{FetchReport, SecretRef, SecretStore};

#[tracing::instrument(name = "secret_page", skip_all)]
pub async fn render_secret_page(
    cfg: &Config,
    store: &dyn SecretStore,
    tokens: &dyn TokenSupplier,
) -> RenderModel {
    let FetchReport { principal, outcome } = fetch(cfg, store, tokens).await;

    // Composition only runs on a successful fetch.
    let result = outcome.and_then(|secret| {
        let conn = compose_if_configured(cfg, &secret)?;
        Ok((secret, conn))
    });

    let mut model = RenderModel {
        principal_message: principal.map(|p| format!("Principal Used: {}", p)),
        ..Default::default()
    };

    match result {
        Ok((secret, conn)) => {
            model.secret_message = Some(format!("Secret: {}", secret.expose()));
            model.connection_string_message =
                conn.map(|c| format!("Connection string: {}", c.expose()));
        }
        Err(e) => {
            tracing::warn!(kind = e.kind(), "Secret page degraded: {}", e);
            model.error_message = Some(format!("Something went wrong: {}", e.user_message()));
        }
    }

    model
}

async fn fetch(cfg: &Config, store: &dyn SecretStore, tokens: &dyn TokenSupplier) -> FetchReport {
    let Some(uri) = cfg.secret_uri.as_deref() else {
        return FetchReport::failed(VaultError::ConfigurationMissing("KEYVAULT_SECRET_URI"));
    };
    match SecretRef::parse(uri) {
        Ok(secret) => store.fetch_secret(&secret, tokens).await,
        Err(e) => FetchReport::failed(e),
    }
}

fn compose_if_configured(
    cfg: &Config,
    secret: &SecretValue,
) -> Result<Option<ConnectionString>, VaultError> {
    if let Some((resource, template)) = cfg.composition() {
        return Ok(Some(compose(template, resource, secret)));
    }
    if cfg.composition_half_configured() {
        let missing = if cfg.resource_name.is_none() {
            "REDIS_RESOURCE_NAME"
        } else {
            "REDIS_CONNECTION_TEMPLATE"
        };
        return Err(VaultError::ConfigurationMissing(missing));
    }
    Ok(None)
}

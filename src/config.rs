use std::time::Duration;

use crate::identity::IdentitySource;

pub const DEFAULT_IMDS_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Key Vault secret identifier, e.g.
    /// `https://myvault.vault.azure.net/secrets/RedisPrimaryKey`.
    pub secret_uri: Option<String>,
    /// Cache resource name substituted into slot `{0}` of the template.
    pub resource_name: Option<String>,
    /// Connection string template with `{0}` (resource) and `{1}` (secret).
    pub connection_template: Option<String>,
    /// Key Vault REST api-version. Set via KEYVAULT_API_VERSION. Default: 7.4.
    pub api_version: String,
    /// Client id of a user-assigned identity. None = system-assigned.
    pub client_id: Option<String>,
    pub identity: IdentitySource,
    /// Optional bound on the TCP/TLS connect phase of outbound calls.
    /// Unset by default: the page adds no timeout of its own.
    pub connect_timeout_secs: Option<u64>,
}

impl Config {
    /// Resource name and template, when both are set. Selects the
    /// connection string step of the page flow.
    pub fn composition(&self) -> Option<(&str, &str)> {
        match (&self.resource_name, &self.connection_template) {
            (Some(r), Some(t)) => Some((r.as_str(), t.as_str())),
            _ => None,
        }
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs)
    }

    /// True when only one of resource name / template is configured.
    pub fn composition_half_configured(&self) -> bool {
        self.resource_name.is_some() != self.connection_template.is_some()
    }
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();
    Ok(from_lookup(|key| std::env::var(key).ok()))
}

/// Builds a [`Config`] from an arbitrary key lookup. `load` passes the
/// process environment; tests pass a map.
pub fn from_lookup<F>(lookup: F) -> Config
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    Config {
        port: non_empty("KEYVAULT_PORT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(8080),
        secret_uri: non_empty("KEYVAULT_SECRET_URI"),
        resource_name: non_empty("REDIS_RESOURCE_NAME"),
        // The template is taken verbatim; surrounding whitespace may be intentional.
        connection_template: lookup("REDIS_CONNECTION_TEMPLATE").filter(|v| !v.is_empty()),
        api_version: non_empty("KEYVAULT_API_VERSION").unwrap_or_else(|| "7.4".into()),
        client_id: non_empty("AZURE_CLIENT_ID"),
        identity: identity_source(&non_empty),
        connect_timeout_secs: non_empty("KEYVAULT_CONNECT_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok()),
    }
}

fn identity_source<F>(var: &F) -> IdentitySource
where
    F: Fn(&str) -> Option<String>,
{
    if let (Some(endpoint), Some(header)) = (var("IDENTITY_ENDPOINT"), var("IDENTITY_HEADER")) {
        return IdentitySource::AppService { endpoint, header };
    }
    if let (Some(endpoint), Some(secret)) = (var("MSI_ENDPOINT"), var("MSI_SECRET")) {
        return IdentitySource::LegacyAppService { endpoint, secret };
    }
    IdentitySource::Imds {
        endpoint: var("AZURE_IMDS_ENDPOINT").unwrap_or_else(|| DEFAULT_IMDS_ENDPOINT.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let cfg = config_from(&[]);
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.api_version, "7.4");
        assert!(cfg.connect_timeout().is_none());
        assert!(cfg.secret_uri.is_none());
        assert!(cfg.composition().is_none());
        assert!(matches!(
            cfg.identity,
            IdentitySource::Imds { ref endpoint } if endpoint == DEFAULT_IMDS_ENDPOINT
        ));
    }

    #[test]
    fn test_connect_timeout_is_opt_in() {
        let cfg = config_from(&[("KEYVAULT_CONNECT_TIMEOUT_SECS", "3")]);
        assert_eq!(cfg.connect_timeout(), Some(Duration::from_secs(3)));

        let cfg = config_from(&[("KEYVAULT_CONNECT_TIMEOUT_SECS", "soon")]);
        assert!(cfg.connect_timeout().is_none());
    }

    #[test]
    fn test_bad_port_falls_back() {
        let cfg = config_from(&[("KEYVAULT_PORT", "not-a-port")]);
        assert_eq!(cfg.port, 8080);
    }

    #[test]
    fn test_app_service_identity_wins() {
        let cfg = config_from(&[
            ("IDENTITY_ENDPOINT", "http://127.0.0.1:41741/msi/token"),
            ("IDENTITY_HEADER", "abc"),
            ("MSI_ENDPOINT", "http://127.0.0.1:41741/legacy"),
            ("MSI_SECRET", "def"),
        ]);
        assert!(matches!(cfg.identity, IdentitySource::AppService { .. }));
    }

    #[test]
    fn test_legacy_identity_needs_both_values() {
        let cfg = config_from(&[("MSI_ENDPOINT", "http://127.0.0.1:41741/legacy")]);
        assert!(matches!(cfg.identity, IdentitySource::Imds { .. }));

        let cfg = config_from(&[
            ("MSI_ENDPOINT", "http://127.0.0.1:41741/legacy"),
            ("MSI_SECRET", "def"),
        ]);
        assert!(matches!(cfg.identity, IdentitySource::LegacyAppService { .. }));
    }

    #[test]
    fn test_composition_requires_both_settings() {
        let cfg = config_from(&[("REDIS_RESOURCE_NAME", "contoso")]);
        assert!(cfg.composition().is_none());
        assert!(cfg.composition_half_configured());

        let cfg = config_from(&[
            ("REDIS_RESOURCE_NAME", "contoso"),
            ("REDIS_CONNECTION_TEMPLATE", "{0}.redis.cache.windows.net,password={1}"),
        ]);
        assert_eq!(
            cfg.composition(),
            Some(("contoso", "{0}.redis.cache.windows.net,password={1}"))
        );
        assert!(!cfg.composition_half_configured());
    }

    #[test]
    fn test_blank_values_count_as_missing() {
        let cfg = config_from(&[("KEYVAULT_SECRET_URI", "   ")]);
        assert!(cfg.secret_uri.is_none());
    }
}

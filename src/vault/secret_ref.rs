use std::fmt;

use url::Url;

use crate::errors::VaultError;

/// Sovereign-cloud vault host suffixes and the token audience each expects.
const AUDIENCES: &[(&str, &str)] = &[
    (".vault.azure.net", "https://vault.azure.net"),
    (".vault.azure.cn", "https://vault.azure.cn"),
    (".vault.usgovcloudapi.net", "https://vault.usgovcloudapi.net"),
    (".vault.microsoftazure.de", "https://vault.microsoftazure.de"),
];

const DEFAULT_AUDIENCE: &str = "https://vault.azure.net";

/// A parsed secret identifier:
/// `https://<vault-host>/secrets/<name>[/<version>]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretRef {
    vault_url: String,
    name: String,
    version: Option<String>,
    audience: &'static str,
}

impl SecretRef {
    pub fn parse(uri: &str) -> Result<Self, VaultError> {
        let url = Url::parse(uri.trim())
            .map_err(|e| VaultError::MalformedSecretUri(format!("not a URL: {}", e)))?;

        let host = url
            .host_str()
            .ok_or_else(|| VaultError::MalformedSecretUri("missing host".into()))?
            .to_ascii_lowercase();

        match url.scheme() {
            "https" => {}
            "http" if is_loopback(&host) => {}
            other => {
                return Err(VaultError::MalformedSecretUri(format!(
                    "unsupported scheme '{}'",
                    other
                )))
            }
        }

        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();

        let (name, version) = match segments.as_slice() {
            ["secrets", name] => (*name, None),
            ["secrets", name, version] => (*name, Some(*version)),
            _ => {
                return Err(VaultError::MalformedSecretUri(
                    "path must be /secrets/<name>[/<version>]".into(),
                ))
            }
        };

        if !is_valid_name(name) {
            return Err(VaultError::MalformedSecretUri(format!(
                "invalid secret name '{}'",
                name
            )));
        }
        if let Some(v) = version {
            if !v.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(VaultError::MalformedSecretUri("invalid secret version".into()));
            }
        }

        let audience = AUDIENCES
            .iter()
            .find(|(suffix, _)| host.ends_with(suffix))
            .map(|(_, aud)| *aud)
            .unwrap_or(DEFAULT_AUDIENCE);

        Ok(Self {
            vault_url: url.origin().ascii_serialization(),
            name: name.to_string(),
            version: version.map(String::from),
            audience,
        })
    }

    pub fn vault_url(&self) -> &str {
        &self.vault_url
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `None` means the latest version.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Resource the bearer token must be issued for.
    pub fn audience(&self) -> &'static str {
        self.audience
    }

    /// Full REST URL for a read of this secret.
    pub fn request_url(&self, api_version: &str) -> String {
        match &self.version {
            Some(v) => format!(
                "{}/secrets/{}/{}?api-version={}",
                self.vault_url, self.name, v, api_version
            ),
            None => format!(
                "{}/secrets/{}?api-version={}",
                self.vault_url, self.name, api_version
            ),
        }
    }
}

impl fmt::Display for SecretRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/secrets/{}", self.vault_url, self.name)?;
        if let Some(v) = &self.version {
            write!(f, "/{}", v)?;
        }
        Ok(())
    }
}

fn is_loopback(host: &str) -> bool {
    matches!(host, "localhost" | "127.0.0.1" | "[::1]" | "::1")
}

/// Key Vault object names: 1-127 characters, alphanumerics and dashes.
fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 127
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

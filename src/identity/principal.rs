//! Which identity a token was issued to.
//!
//! Read from the token's JWT payload without verifying the signature. The
//! result is shown on the page for diagnostics and must never be used to
//! make an access decision.

use std::fmt;

use base64::Engine;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PrincipalKind {
    App,
    User,
}

impl fmt::Display for PrincipalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrincipalKind::App => f.write_str("App"),
            PrincipalKind::User => f.write_str("User"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrincipalInfo {
    pub app_id: Option<String>,
    pub tenant_id: Option<String>,
    pub object_id: Option<String>,
    pub user_principal_name: Option<String>,
    pub kind: PrincipalKind,
}

impl PrincipalInfo {
    /// Principal known only by client id, e.g. when the token is not a JWT.
    pub fn from_client_id(client_id: &str) -> Self {
        Self {
            app_id: Some(client_id.to_string()),
            tenant_id: None,
            object_id: None,
            user_principal_name: None,
            kind: PrincipalKind::App,
        }
    }

    /// Principal of a token that carries nothing identifying and came with
    /// no client id. Managed identities are always applications.
    pub fn unidentified() -> Self {
        Self {
            app_id: None,
            tenant_id: None,
            object_id: None,
            user_principal_name: None,
            kind: PrincipalKind::App,
        }
    }

    /// Decodes the claims segment of `token`. Returns `None` if the token
    /// is not a three-part JWT or carries no identifying claim.
    pub fn from_jwt(token: &str) -> Option<Self> {
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            return None;
        }

        let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
        let payload = engine.decode(parts[1].trim_end_matches('=')).ok()?;
        let raw: serde_json::Value = serde_json::from_slice(&payload).ok()?;

        let claim = |name: &str| raw.get(name).and_then(|v| v.as_str()).map(String::from);

        let user_principal_name = claim("upn").or_else(|| claim("unique_name"));
        let info = Self {
            app_id: claim("appid").or_else(|| claim("azp")),
            tenant_id: claim("tid"),
            object_id: claim("oid"),
            kind: if user_principal_name.is_some() {
                PrincipalKind::User
            } else {
                PrincipalKind::App
            },
            user_principal_name,
        };

        if info.app_id.is_none() && info.object_id.is_none() && info.user_principal_name.is_none() {
            return None;
        }
        Some(info)
    }
}

impl fmt::Display for PrincipalInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id_field = match self.kind {
            PrincipalKind::User => ("UserPrincipalName", &self.user_principal_name),
            PrincipalKind::App => ("AppId", &self.app_id),
        };
        let fields = [
            id_field,
            ("TenantId", &self.tenant_id),
            ("ObjectId", &self.object_id),
        ];
        for (label, value) in fields {
            if let Some(v) = value {
                write!(f, "{}: {}, ", label, v)?;
            }
        }
        write!(f, "Type: {}", self.kind)
    }
}

use serde::Serialize;

/// What the page shows for one request. Every field is optional; an
/// absent field renders as nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderModel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_string_message: Option<String>,
}

impl RenderModel {
    #[cfg(test)]
    pub fn is_success(&self) -> bool {
        self.error_message.is_none() && self.secret_message.is_some()
    }
}

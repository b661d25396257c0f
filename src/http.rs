//! Outbound HTTP client shared by the identity provider and the secret store.
//!
//! No retry middleware: the page performs exactly one fetch per request.
//! No timeout either unless `KEYVAULT_CONNECT_TIMEOUT_SECS` asks for a
//! connect bound; cancellation comes from the inbound request going away.

use anyhow::Context;
use std::time::Duration;

pub fn build_client(connect_timeout: Option<Duration>) -> anyhow::Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .use_rustls_tls()
        .pool_max_idle_per_host(4)
        .user_agent(concat!("keyvault-webapp/", env!("CARGO_PKG_VERSION")));
    if let Some(timeout) = connect_timeout {
        builder = builder.connect_timeout(timeout);
    }
    builder
        .build()
        .context("failed to build HTTP client")
}

/// Cuts a response body down for debug logs.
pub(crate) fn truncate_for_log(body: &str, max: usize) -> &str {
    if body.len() <= max {
        return body;
    }
    let mut end = max;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

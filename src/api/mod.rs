use std::sync::Arc;

use axum::{extract::State, routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing::Instrument;

use crate::errors::AppError;
use crate::AppState;

pub mod handlers;
pub mod view;

/// Build the application router: the secret page, its JSON twin and the
/// health checks.
pub fn app_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/secret", get(handlers::secret_json))
        .route("/healthz", get(|| async { "ok" }))
        .route("/readyz", get(readiness_check))
        .fallback(fallback_404)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(axum::middleware::from_fn(security_headers_middleware))
}

/// Ready once a secret identifier is configured. The page still renders
/// without one, it just shows the configuration error.
async fn readiness_check(State(state): State<Arc<AppState>>) -> Result<&'static str, AppError> {
    if state.config.secret_uri.is_none() {
        return Err(AppError::NotReady("KEYVAULT_SECRET_URI is not set"));
    }
    Ok("ok")
}

async fn fallback_404() -> AppError {
    AppError::NotFound
}

/// Middleware: injects a unique X-Request-Id into every response.
/// This allows clients to correlate a degraded page with server logs.
async fn request_id_middleware(
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let req_id = uuid::Uuid::new_v4().to_string();
    let span = tracing::info_span!("request", request_id = %req_id, path = %req.uri().path());
    let mut resp = next.run(req).instrument(span).await;
    if let Ok(val) = axum::http::HeaderValue::from_str(&req_id) {
        resp.headers_mut().insert("x-request-id", val);
    }
    resp
}

/// Middleware: injects security headers into every response.
/// The page carries a secret, so nothing may be cached or framed.
async fn security_headers_middleware(
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    use axum::http::HeaderValue;

    let mut resp = next.run(req).await;
    let headers = resp.headers_mut();

    headers.insert("X-Content-Type-Options", HeaderValue::from_static("nosniff"));
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert("Cache-Control", HeaderValue::from_static("no-store"));
    headers.insert("Referrer-Policy", HeaderValue::from_static("no-referrer"));
    headers.insert(
        "Content-Security-Policy",
        HeaderValue::from_static("default-src 'none'; style-src 'unsafe-inline'"),
    );
    headers.remove("Server");

    resp
}

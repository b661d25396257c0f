use std::sync::Arc;

use axum::{extract::State, response::Html, Json};

use crate::flow::render_secret_page;
use crate::models::render::RenderModel;
use crate::AppState;

/// `GET /` — the secret page. Always 200; failures render as a message.
pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    let model = run(&state).await;
    Html(super::view::render_page(&model))
}

/// `GET /api/secret` — same model as the page, as JSON.
pub async fn secret_json(State(state): State<Arc<AppState>>) -> Json<RenderModel> {
    Json(run(&state).await)
}

async fn run(state: &AppState) -> RenderModel {
    render_secret_page(&state.config, state.store.as_ref(), state.tokens.as_ref()).await
}

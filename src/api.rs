use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use metrics::counter;
use serde::Serialize;
use tracing::{error, info};

use crate::middleware::BoundaryPolicy;
use crate::store::NewsStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<NewsStore>,
}

impl AppState {
    pub fn new(store: Arc<NewsStore>) -> Self {
        Self { store }
    }
}

/// Bare routes, no boundary controls.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/news", get(get_news))
        .with_state(state)
}

/// Routes wrapped in request logging, CORS and CSRF, as served by the binary.
pub fn create_router(state: AppState, boundary: &BoundaryPolicy) -> Router {
    boundary.apply(router(state))
}

async fn get_news(State(state): State<AppState>) -> Response {
    let news = state.store.snapshot();
    if news.is_empty() {
        counter!("news_requests_total", "outcome" => "empty").increment(1);
        info!(target: "http", "no news available");
        return StatusCode::NO_CONTENT.into_response();
    }
    render_json(&news)
}

// Either the full array or a bare 500; never a truncated body.
fn render_json<T: Serialize>(items: &[T]) -> Response {
    match serde_json::to_vec(items) {
        Ok(body) => {
            counter!("news_requests_total", "outcome" => "ok").increment(1);
            info!(target: "http", count = items.len(), "returned news");
            ([(CONTENT_TYPE, "application/json")], body).into_response()
        }
        Err(e) => {
            counter!("news_requests_total", "outcome" => "error").increment(1);
            error!(target: "http", error = %e, "failed to encode news");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

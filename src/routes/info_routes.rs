use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};

use serde::Serialize;
use tokio::fs;
use tracing::{debug, error};

use crate::state::app_state::AppState;

#[derive(Serialize)]
pub struct HealthStatus {
    status: String,
    readers: usize,
    signals: usize,
}

pub fn health_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_page))
        .route("/health", get(health_check))
        .route("/info", get(info_check))
        .route("/stop", get(stop_process))
        .with_state(state)
}

async fn index_page() -> Response {
    fs::read_to_string("data/index.html")
        .await
        .map(Html)
        .map(IntoResponse::into_response)
        .unwrap_or_else(|e| {
            error!("Index.html read error: {}", e);
            StatusCode::NOT_FOUND.into_response()
        })
}

pub async fn info_check() -> Response {
    let config = crate::utils::conf_helper::get_cached_config();

    debug!("{} requested", config.name);
    Json(config).into_response()
}

async fn health_check(State(state): State<AppState>) -> Response {
    let readers = state.readers.read().await.len();
    let signals = state.signals.read().await.len();

    Json(HealthStatus {
        status: "ok".to_owned(),
        readers,
        signals,
    })
    .into_response()
}

async fn stop_process() -> impl IntoResponse {
    error!("Stop endpoint called, shutting down process");

    // Give the response and logs a moment to flush.
    tokio::spawn(async {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        std::process::exit(0);
    });

    StatusCode::OK
}

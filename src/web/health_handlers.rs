// src/web/health_handlers.rs
use crate::{db, state::AppState};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

// GET /test_db_connections
pub async fn test_db_connections(State(state): State<AppState>) -> impl IntoResponse {
    match db::ping(&state.db_pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "message": "All connections are healthy" })),
        ),
        Err(e) => {
            tracing::error!("Diagnóstico da DB falhou: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "One or more connections are not healthy" })),
            )
        }
    }
}

// GET /test_auth
pub async fn test_auth() -> impl IntoResponse {
    Json(json!({ "message": "You are authenticated." }))
}

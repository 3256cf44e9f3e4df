// src/web/auth_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::user::LoginPayload,
    services::{auth_service, user_service},
    state::AppState,
    web::{extract::ValidatedJson, mw_auth::SESSION_USER_KEY},
};
use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;
use tower_sessions::Session;

// POST /login
pub async fn handle_login(
    State(state): State<AppState>,
    session: Session,
    ValidatedJson(payload): ValidatedJson<LoginPayload>,
) -> AppResult<impl IntoResponse> {
    tracing::info!("Tentativa de login para: {}", payload.email);

    let user = auth_service::authenticate(&state.db_pool, &payload.email, &payload.password).await?;

    // Novo ID de sessão a cada login
    session
        .cycle_id()
        .await
        .map_err(|e| AppError::SessionError(format!("Falha ao rodar ID: {}", e)))?;
    session
        .insert(SESSION_USER_KEY, user.id)
        .await
        .map_err(|e| AppError::SessionError(format!("Falha ao inserir na sessão: {}", e)))?;

    let mut conn = state.db_pool.acquire().await?;
    let detail = user_service::load_user_detail(&mut conn, user).await?;

    tracing::info!("✅ Login bem-sucedido para: {}", detail.user.email);
    Ok(Json(json!({ "message": "Login successful", "user": detail })))
}

// POST /logout
pub async fn handle_logout(session: Session) -> AppResult<impl IntoResponse> {
    let user_id: Option<i64> = session.get(SESSION_USER_KEY).await.ok().flatten();

    session
        .delete()
        .await
        .map_err(|e| AppError::SessionError(format!("Falha ao apagar sessão: {}", e)))?;

    match user_id {
        Some(id) => tracing::info!("🚪 Utilizador {} desligado.", id),
        None => tracing::info!("🚪 Sessão anónima desligada."),
    }

    Ok(Json(json!({ "message": "Logged out" })))
}

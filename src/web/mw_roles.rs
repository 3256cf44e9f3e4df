// src/web/mw_roles.rs
use crate::{
    error::AppError,
    models::role::{ROLE_ADMIN, ROLE_CLIENT, ROLE_EMPLOYEE},
    services::user_service,
    state::AppState,
    web::extract::CurrentUser,
};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

/// Segue para o handler se o utilizador tiver pelo menos uma das roles.
/// Corre *depois* de `require_auth`.
async fn require_roles(
    state: &AppState,
    CurrentUser(user_id): CurrentUser,
    allowed: &[&str],
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    tracing::debug!("Roles MW: verificando {:?} para user {}", allowed, user_id);

    if user_service::check_user_role_any(&state.db_pool, user_id, allowed).await? {
        Ok(next.run(request).await)
    } else {
        tracing::warn!(
            "Roles MW: acesso negado a {} para user {} (precisa de {:?}).",
            request.uri(),
            user_id,
            allowed
        );
        Err(AppError::Forbidden)
    }
}

pub async fn require_admin(
    State(state): State<AppState>,
    user: CurrentUser,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    require_roles(&state, user, &[ROLE_ADMIN], request, next).await
}

pub async fn require_client(
    State(state): State<AppState>,
    user: CurrentUser,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    require_roles(&state, user, &[ROLE_CLIENT], request, next).await
}

/// Catálogo: admin ou employee.
pub async fn require_staff(
    State(state): State<AppState>,
    user: CurrentUser,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    require_roles(&state, user, &[ROLE_ADMIN, ROLE_EMPLOYEE], request, next).await
}

pub async fn require_any_role(
    State(state): State<AppState>,
    user: CurrentUser,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    require_roles(
        &state,
        user,
        &[ROLE_ADMIN, ROLE_CLIENT, ROLE_EMPLOYEE],
        request,
        next,
    )
    .await
}

// src/web/mw_auth.rs
use crate::{error::AppError, web::extract::CurrentUser};
use axum::{extract::Request, middleware::Next, response::Response};
use tower_sessions::Session;

/// Chave da sessão onde o login guarda o ID numérico do utilizador.
pub const SESSION_USER_KEY: &str = "user_id";

// Middleware que verifica se o utilizador está logado
pub async fn require_auth(
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    match session.get::<i64>(SESSION_USER_KEY).await {
        Ok(Some(user_id)) => {
            tracing::debug!("Autenticação MW: utilizador {} autenticado.", user_id);
            // Os handlers leem o ID com o extractor CurrentUser
            request.extensions_mut().insert(CurrentUser(user_id));
            Ok(next.run(request).await)
        }
        Ok(None) => {
            tracing::debug!("Autenticação MW: pedido sem sessão ({})", request.uri());
            Err(AppError::Unauthorized)
        }
        Err(e) => {
            tracing::error!("Autenticação MW: erro ao ler sessão: {:?}", e);
            Err(AppError::SessionError(format!("Erro ao verificar sessão: {}", e)))
        }
    }
}

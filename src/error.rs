// src/error.rs
use axum::{
    extract::rejection::{PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Erro na base de dados: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Erro de migração da base de dados: {0}")]
    SqlxMigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Erro de variável de ambiente: {0}")]
    EnvVarError(#[from] std::env::VarError),

    #[error("Configuração inválida: {0}")]
    ConfigError(String),

    #[error("Erro ao processar password")]
    PasswordHashingError,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Erro na sessão: {0}")]
    SessionError(String),

    #[error("Erro interno inesperado")]
    InternalServerError,

    // Sem sessão válida
    #[error("Não autorizado")]
    Unauthorized,

    // Sessão válida mas sem a role necessária
    #[error("Acesso negado")]
    Forbidden,

    #[error("Dados inválidos: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// Corpo do pedido que nem chegou a ser validado (JSON mal formado, multipart partido).
    #[error("Pedido mal formado: {0}")]
    MalformedBody(String),

    #[error("{message}: {original}")]
    NotFound { message: String, original: String },

    #[error("{message}")]
    BadRequest {
        message: String,
        original: Option<String>,
    },
}

// Rejeições do próprio axum também saem em JSON com `code`
impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::MalformedBody(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::MalformedBody(rejection.body_text())
    }
}

impl AppError {
    pub fn not_found(message: impl Into<String>, original: impl ToString) -> Self {
        AppError::NotFound {
            message: message.into(),
            original: original.to_string(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest {
            message: message.into(),
            original: None,
        }
    }

    /// Código estável para os clientes poderem tratar erros sem comparar mensagens.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_failed",
            AppError::MalformedBody(_) => "malformed_body",
            AppError::Unauthorized => "unauthorized",
            AppError::Forbidden => "forbidden",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::NotFound { .. } => "not_found",
            AppError::BadRequest { .. } => "bad_request",
            _ => "internal_error",
        }
    }
}

// Como converter AppError numa resposta HTTP (JSON)
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();

        let (status, body) = match self {
            AppError::Validation(errors) => {
                tracing::debug!("Validação falhou: {:?}", errors);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    json!({ "code": code, "message": "Validation failed", "errors": errors }),
                )
            }
            AppError::MalformedBody(detail) => {
                tracing::debug!("Corpo mal formado: {}", detail);
                (
                    StatusCode::BAD_REQUEST,
                    json!({ "code": code, "message": "Malformed request body", "originalErrorMessage": detail }),
                )
            }
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({ "code": code, "message": "You need to be logged in!" }),
            ),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                json!({ "code": code, "message": "You are not allowed to access this resource." }),
            ),
            // Mensagem genérica, não revela se o email existe
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                json!({ "code": code, "message": "Invalid credentials" }),
            ),
            AppError::NotFound { message, original } => {
                tracing::debug!("{}: {}", message, original);
                (
                    StatusCode::NOT_FOUND,
                    json!({ "code": code, "message": message, "originalErrorMessage": original }),
                )
            }
            AppError::BadRequest { message, original } => {
                tracing::warn!("Pedido rejeitado: {} ({:?})", message, original);
                let body = match original {
                    Some(original) => {
                        json!({ "code": code, "message": message, "originalErrorMessage": original })
                    }
                    None => json!({ "code": code, "message": message }),
                };
                (StatusCode::BAD_REQUEST, body)
            }
            other => {
                // Loga o erro detalhado no servidor; o cliente recebe só a mensagem genérica
                tracing::error!("Erro processado: {:?}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "code": code, "message": "Unexpected server error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Etiqueta um erro de baixo nível com o passo que falhou.
pub trait ResultExt<T> {
    fn or_bad_request(self, message: &str) -> AppResult<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn or_bad_request(self, message: &str) -> AppResult<T> {
        self.map_err(|e| AppError::BadRequest {
            message: message.to_string(),
            original: Some(e.to_string()),
        })
    }
}

/// `RowNotFound` vira 404 com a mensagem dada; os outros erros da DB seguem como 500.
pub trait RowExt<T> {
    fn or_not_found(self, message: &str) -> AppResult<T>;
}

impl<T> RowExt<T> for Result<T, sqlx::Error> {
    fn or_not_found(self, message: &str) -> AppResult<T> {
        self.map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::not_found(message, e),
            other => AppError::SqlxError(other),
        })
    }
}

// Tipo Result padrão para a aplicação
pub type AppResult<T = ()> = Result<T, AppError>;

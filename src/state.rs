// src/state.rs
use crate::services::{mail_service::Mailer, storage_service::ImageStorage};
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    // Destino das fotos de perfil (fora da transação da base de dados)
    pub storage: Arc<dyn ImageStorage>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(
        db_pool: SqlitePool,
        storage: Arc<dyn ImageStorage>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        AppState {
            db_pool,
            storage,
            mailer,
        }
    }
}

// Permite extrair o pool da DB diretamente
impl axum::extract::FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> SqlitePool {
        state.db_pool.clone()
    }
}

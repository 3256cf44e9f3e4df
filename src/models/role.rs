// src/models/role.rs
use serde::Serialize;
use sqlx::FromRow;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_CLIENT: &str = "client";
pub const ROLE_EMPLOYEE: &str = "employee";

/// Forma reduzida usada quando as roles vêm pré-carregadas com o utilizador.
#[derive(Debug, Clone, FromRow, Serialize, PartialEq, Eq)]
pub struct RoleSummary {
    pub id: i64,
    pub name: String,
}

// src/models/user.rs
use crate::models::{address::Address, role::RoleSummary};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

// Representa um utilizador lido da tabela 'users'
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub secure_id: String,
    pub name: String,
    pub cpf: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub profile_pic_url: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Utilizador com as relações pré-carregadas (roles e moradas).
#[derive(Debug, Clone, Serialize)]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: User,
    pub roles: Vec<RoleSummary>,
    pub addresses: Vec<Address>,
}

// Dados para login (JSON)
#[derive(Debug, Deserialize, Validate)]
pub struct LoginPayload {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Campos do registo; vêm de um formulário multipart.
#[derive(Debug, Default, Validate)]
pub struct StoreUserPayload {
    #[validate(length(min = 3, max = 50, message = "Name must have between 3 and 50 characters"))]
    pub name: String,
    #[validate(custom(function = "validate_cpf"))]
    pub cpf: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 6, max = 180, message = "Password must have at least 6 characters"))]
    pub password: String,
    #[validate(length(max = 20, message = "Zip code is too long"))]
    pub zip_code: Option<String>,
    #[validate(length(min = 2, max = 50, message = "State is required"))]
    pub state: String,
    #[validate(length(min = 1, max = 100, message = "City is required"))]
    pub city: String,
    #[validate(length(min = 1, max = 150, message = "Street is required"))]
    pub street: String,
    #[validate(length(max = 100))]
    pub district: Option<String>,
    #[validate(range(min = 0, message = "Number must be positive"))]
    pub number: Option<i64>,
    #[validate(length(max = 150))]
    pub complement: Option<String>,
}

/// Atualização parcial: só os campos presentes são alterados.
#[derive(Debug, Default, Validate)]
pub struct UpdateUserPayload {
    #[validate(length(min = 3, max = 50, message = "Name must have between 3 and 50 characters"))]
    pub name: Option<String>,
    #[validate(custom(function = "validate_cpf"))]
    pub cpf: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    #[validate(length(min = 6, max = 180, message = "Password must have at least 6 characters"))]
    pub password: Option<String>,
    #[validate(range(min = 1))]
    pub address_id: Option<i64>,
    #[validate(length(max = 20, message = "Zip code is too long"))]
    pub zip_code: Option<String>,
    #[validate(length(min = 2, max = 50))]
    pub state: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub city: Option<String>,
    #[validate(length(min = 1, max = 150))]
    pub street: Option<String>,
    #[validate(length(max = 100))]
    pub district: Option<String>,
    #[validate(range(min = 0, message = "Number must be positive"))]
    pub number: Option<i64>,
    #[validate(length(max = 150))]
    pub complement: Option<String>,
}

impl UpdateUserPayload {
    pub fn touches_address(&self) -> bool {
        self.zip_code.is_some()
            || self.state.is_some()
            || self.city.is_some()
            || self.street.is_some()
            || self.district.is_some()
            || self.number.is_some()
            || self.complement.is_some()
    }
}

/// POST /users/access_allow
#[derive(Debug, Deserialize, Validate)]
pub struct AccessAllowPayload {
    #[validate(range(min = 1))]
    pub user_id: i64,
    #[validate(length(min = 1, message = "At least one role is required"))]
    pub roles: Vec<String>,
}

/// Filtros opcionais da listagem de utilizadores.
#[derive(Debug, Default, Deserialize)]
pub struct UserFilters {
    pub name: Option<String>,
    pub email: Option<String>,
    pub cpf: Option<String>,
}

/// Aceita "000.000.000-00" ou só os 11 dígitos.
pub fn validate_cpf(cpf: &str) -> Result<(), ValidationError> {
    let only_allowed = cpf.chars().all(|c| c.is_ascii_digit() || c == '.' || c == '-');
    let digits = cpf.chars().filter(char::is_ascii_digit).count();
    if only_allowed && digits == 11 {
        Ok(())
    } else {
        Err(ValidationError::new("cpf").with_message("CPF must have 11 digits".into()))
    }
}

/// Só os dígitos do CPF (usado em nomes de ficheiros).
pub fn cpf_digits(cpf: &str) -> String {
    cpf.chars().filter(char::is_ascii_digit).collect()
}

// src/models/category.rs
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub observation: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Deserialize, Validate)]
pub struct StoreCategoryPayload {
    #[validate(
        length(min = 3, max = 50, message = "Name must have between 3 and 50 characters"),
        custom(function = "validate_category_name")
    )]
    pub name: String,
    pub observation: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCategoryPayload {
    #[validate(
        length(min = 3, max = 50, message = "Name must have between 3 and 50 characters"),
        custom(function = "validate_category_name")
    )]
    pub name: Option<String>,
    pub observation: Option<String>,
}

// Só letras (incluindo acentuadas) e espaços
fn validate_category_name(name: &str) -> Result<(), ValidationError> {
    if name.chars().all(|c| c.is_alphabetic() || c == ' ') {
        Ok(())
    } else {
        Err(ValidationError::new("letters_only")
            .with_message("Name may only contain letters and spaces".into()))
    }
}

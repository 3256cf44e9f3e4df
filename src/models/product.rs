// src/models/product.rs
use crate::models::category::Category;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub secure_id: String,
    pub name: String,
    pub code: String,
    pub price: f64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductWithCategories {
    #[serde(flatten)]
    pub product: Product,
    pub categories: Vec<Category>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct StoreProductPayload {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 50, message = "Code is required"))]
    pub code: String,
    #[validate(range(min = 0.01, message = "Price must be greater than zero"))]
    pub price: f64,
    // Nomes de categorias; os que não existem são ignorados
    #[serde(default)]
    pub categories: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProductPayload {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub code: Option<String>,
    #[validate(range(min = 0.01, message = "Price must be greater than zero"))]
    pub price: Option<f64>,
    /// Quando presente substitui o conjunto inteiro (sync).
    pub categories: Option<Vec<String>>,
}

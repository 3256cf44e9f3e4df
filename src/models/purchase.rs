// src/models/purchase.rs
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Compra feita a partir de uma linha do carrinho; guarda os valores do momento.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub id: i64,
    pub secure_id: String,
    pub user_id: i64,
    /// ID histórico da linha do carrinho comprada. A linha é apagada no checkout,
    /// por isso não é chave estrangeira e não deve ser seguida.
    pub cart_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub product_code: String,
    pub unit_price: f64,
    pub quantity: i64,
    pub total_price: f64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Deserialize, Validate)]
pub struct StorePurchasePayload {
    #[validate(range(min = 1))]
    pub cart_id: i64,
}

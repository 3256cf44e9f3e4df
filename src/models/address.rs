// src/models/address.rs
use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: i64,
    pub user_id: i64,
    pub zip_code: Option<String>,
    pub state: String,
    pub city: String,
    pub street: String,
    pub district: Option<String>,
    pub number: Option<i64>,
    pub complement: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

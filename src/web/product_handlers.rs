// src/web/product_handlers.rs
use crate::{
    error::AppResult,
    models::{
        pagination::PaginationParams,
        product::{StoreProductPayload, UpdateProductPayload},
    },
    services::product_service,
    state::AppState,
    web::extract::{AppPath, AppQuery, ValidatedJson},
};
use axum::{
    extract::State,
    response::IntoResponse,
    Json,
};
use serde_json::json;

const PRODUCTS_PER_PAGE: u32 = 10;

// GET /products
pub async fn index(
    State(state): State<AppState>,
    AppQuery(pagination): AppQuery<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let products =
        product_service::list_products(&state.db_pool, pagination.resolve(PRODUCTS_PER_PAGE))
            .await?;
    Ok(Json(products))
}

// POST /products
pub async fn store(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<StoreProductPayload>,
) -> AppResult<impl IntoResponse> {
    let product = product_service::create_product(&state.db_pool, &payload).await?;
    Ok(Json(product))
}

// GET /products/{secureId}
pub async fn show(
    State(state): State<AppState>,
    AppPath(secure_id): AppPath<String>,
) -> AppResult<impl IntoResponse> {
    let product = product_service::find_product_by_secure_id(&state.db_pool, &secure_id).await?;
    Ok(Json(product))
}

// PUT|PATCH /products/{secureId}
pub async fn update(
    State(state): State<AppState>,
    AppPath(secure_id): AppPath<String>,
    ValidatedJson(payload): ValidatedJson<UpdateProductPayload>,
) -> AppResult<impl IntoResponse> {
    let product = product_service::update_product(&state.db_pool, &secure_id, &payload).await?;
    Ok(Json(product))
}

// DELETE /products/{secureId}
pub async fn destroy(
    State(state): State<AppState>,
    AppPath(secure_id): AppPath<String>,
) -> AppResult<impl IntoResponse> {
    product_service::delete_product(&state.db_pool, &secure_id).await?;
    Ok(Json(json!({ "message": "Product deleted successfully" })))
}

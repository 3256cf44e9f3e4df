// src/web/purchase_handlers.rs
use crate::{
    error::AppResult,
    models::{pagination::PaginationParams, purchase::StorePurchasePayload},
    services::purchase_service,
    state::AppState,
    web::extract::{AppPath, AppQuery, CurrentUser, ValidatedJson},
};
use axum::{
    extract::State,
    response::IntoResponse,
    Json,
};

const PURCHASES_PER_PAGE: u32 = 10;

// GET /purchases
pub async fn index(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    AppQuery(pagination): AppQuery<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let purchases = purchase_service::list_purchases(
        &state.db_pool,
        user_id,
        pagination.resolve(PURCHASES_PER_PAGE),
    )
    .await?;
    Ok(Json(purchases))
}

// POST /purchases (checkout de uma linha do carrinho)
pub async fn store(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ValidatedJson(payload): ValidatedJson<StorePurchasePayload>,
) -> AppResult<impl IntoResponse> {
    let purchase = purchase_service::create_purchase(&state.db_pool, user_id, payload.cart_id).await?;
    Ok(Json(purchase))
}

// GET /purchases/{secureId}
pub async fn show(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    AppPath(secure_id): AppPath<String>,
) -> AppResult<impl IntoResponse> {
    let purchase = purchase_service::find_purchase(&state.db_pool, user_id, &secure_id).await?;
    Ok(Json(purchase))
}

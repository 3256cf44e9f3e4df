// src/web/cart_handlers.rs
use crate::{
    error::AppResult,
    models::cart::{StoreCartPayload, UpdateCartPayload},
    services::cart_service,
    state::AppState,
    web::extract::{AppPath, CurrentUser, ValidatedJson},
};
use axum::{
    extract::State,
    response::IntoResponse,
    Json,
};
use serde_json::json;

// Todas as rotas do carrinho operam sobre o carrinho de quem está logado;
// o {id} do path é o ID do produto.

// GET /cart
pub async fn index(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> AppResult<impl IntoResponse> {
    let (cart_info, items_cart) = cart_service::list_cart(&state.db_pool, user_id).await?;
    Ok(Json(json!({ "cartInfo": cart_info, "itemsCart": items_cart })))
}

// POST /cart
pub async fn store(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ValidatedJson(payload): ValidatedJson<StoreCartPayload>,
) -> AppResult<impl IntoResponse> {
    let cart = cart_service::add_to_cart(&state.db_pool, user_id, &payload).await?;
    Ok(Json(cart))
}

// GET /cart/{productId}
pub async fn show(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    AppPath(product_id): AppPath<i64>,
) -> AppResult<impl IntoResponse> {
    let item = cart_service::find_cart_item(&state.db_pool, user_id, product_id).await?;
    Ok(Json(json!({
        "totalItemPrice": format!("{:.2}", item.subtotal()),
        "cartItems": item,
    })))
}

// PUT|PATCH /cart/{productId}
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    AppPath(product_id): AppPath<i64>,
    ValidatedJson(payload): ValidatedJson<UpdateCartPayload>,
) -> AppResult<impl IntoResponse> {
    let cart =
        cart_service::adjust_quantity(&state.db_pool, user_id, product_id, payload.adjustment())
            .await?;
    Ok(Json(cart))
}

// DELETE /cart/{productId}
pub async fn destroy(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    AppPath(product_id): AppPath<i64>,
) -> AppResult<impl IntoResponse> {
    cart_service::remove_from_cart(&state.db_pool, user_id, product_id).await?;
    Ok(Json(json!({ "message": "Item removed successfully" })))
}

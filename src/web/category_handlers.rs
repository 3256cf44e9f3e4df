// src/web/category_handlers.rs
use crate::{
    error::AppResult,
    models::{
        category::{StoreCategoryPayload, UpdateCategoryPayload},
        pagination::PaginationParams,
    },
    services::category_service,
    state::AppState,
    web::extract::{AppPath, AppQuery, ValidatedJson},
};
use axum::{
    extract::State,
    response::IntoResponse,
    Json,
};
use serde_json::json;

const CATEGORIES_PER_PAGE: u32 = 10;

pub async fn index(
    State(state): State<AppState>,
    AppQuery(pagination): AppQuery<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let categories =
        category_service::list_categories(&state.db_pool, pagination.resolve(CATEGORIES_PER_PAGE))
            .await?;
    Ok(Json(categories))
}

pub async fn store(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<StoreCategoryPayload>,
) -> AppResult<impl IntoResponse> {
    let category = category_service::create_category(&state.db_pool, &payload).await?;
    Ok(Json(category))
}

pub async fn show(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> AppResult<impl IntoResponse> {
    let category = category_service::find_category(&state.db_pool, id).await?;
    Ok(Json(category))
}

pub async fn update(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    ValidatedJson(payload): ValidatedJson<UpdateCategoryPayload>,
) -> AppResult<impl IntoResponse> {
    let category = category_service::update_category(&state.db_pool, id, &payload).await?;
    Ok(Json(category))
}

pub async fn destroy(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> AppResult<impl IntoResponse> {
    category_service::delete_category(&state.db_pool, id).await?;
    Ok(Json(json!({ "message": "Category deleted successfully" })))
}

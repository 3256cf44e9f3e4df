// src/web/user_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        pagination::PaginationParams,
        role::ROLE_ADMIN,
        user::{AccessAllowPayload, StoreUserPayload, UpdateUserPayload, UserFilters},
    },
    services::user_service,
    state::AppState,
    web::extract::{AppPath, AppQuery, CurrentUser, MultipartForm, ValidatedJson},
};
use axum::{
    extract::State,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use validator::Validate;

const USERS_PER_PAGE: u32 = 2;

// Campos do formulário de registo (nomes em camelCase, como o cliente os envia)
fn store_payload_from(form: &mut MultipartForm) -> AppResult<StoreUserPayload> {
    Ok(StoreUserPayload {
        name: form.text("name").unwrap_or_default(),
        cpf: form.text("cpf").unwrap_or_default(),
        email: form.text("email").unwrap_or_default(),
        password: form.text("password").unwrap_or_default(),
        zip_code: form.text("zipCode"),
        state: form.text("state").unwrap_or_default(),
        city: form.text("city").unwrap_or_default(),
        street: form.text("street").unwrap_or_default(),
        district: form.text("district"),
        number: form.integer("number")?,
        complement: form.text("complement"),
    })
}

fn update_payload_from(form: &mut MultipartForm) -> AppResult<UpdateUserPayload> {
    Ok(UpdateUserPayload {
        name: form.text("name"),
        cpf: form.text("cpf"),
        email: form.text("email"),
        password: form.text("password"),
        address_id: form.integer("addressId")?,
        zip_code: form.text("zipCode"),
        state: form.text("state"),
        city: form.text("city"),
        street: form.text("street"),
        district: form.text("district"),
        number: form.integer("number")?,
        complement: form.text("complement"),
    })
}

fn user_not_found(secure_id: &str) -> AppError {
    AppError::not_found("User not found", format!("no user with secure id {}", secure_id))
}

// GET /users (admin)
pub async fn index(
    State(state): State<AppState>,
    AppQuery(pagination): AppQuery<PaginationParams>,
    AppQuery(filters): AppQuery<UserFilters>,
) -> AppResult<impl IntoResponse> {
    let page = pagination.resolve(USERS_PER_PAGE);
    let users = user_service::list_users(&state.db_pool, page, &filters).await?;
    Ok(Json(users))
}

// POST /users (público, multipart)
pub async fn store(
    State(state): State<AppState>,
    mut form: MultipartForm,
) -> AppResult<impl IntoResponse> {
    let payload = store_payload_from(&mut form)?;
    payload.validate()?;

    let user_found = user_service::register_user(
        &state.db_pool,
        state.storage.as_ref(),
        state.mailer.as_ref(),
        payload,
        form.image.take(),
    )
    .await?;

    Ok(Json(json!({ "userFound": user_found })))
}

// GET /users/{secureId} (admin)
pub async fn show(
    State(state): State<AppState>,
    AppPath(secure_id): AppPath<String>,
) -> AppResult<impl IntoResponse> {
    let user = user_service::find_user_by_secure_id(&state.db_pool, &secure_id)
        .await?
        .ok_or_else(|| user_not_found(&secure_id))?;

    let mut conn = state.db_pool.acquire().await?;
    let detail = user_service::load_user_detail(&mut conn, user).await?;
    Ok(Json(detail))
}

// PUT|PATCH /users/{secureId} (o próprio utilizador, ou um admin)
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(current_id): CurrentUser,
    AppPath(secure_id): AppPath<String>,
    mut form: MultipartForm,
) -> AppResult<impl IntoResponse> {
    let user = user_service::find_user_by_secure_id(&state.db_pool, &secure_id)
        .await?
        .ok_or_else(|| user_not_found(&secure_id))?;

    if user.id != current_id
        && !user_service::check_user_role_any(&state.db_pool, current_id, &[ROLE_ADMIN]).await?
    {
        tracing::warn!(
            "User {} tentou alterar os dados de {} sem ser admin.",
            current_id,
            secure_id
        );
        return Err(AppError::Forbidden);
    }

    let payload = update_payload_from(&mut form)?;
    payload.validate()?;

    let user_found = user_service::update_user(
        &state.db_pool,
        state.storage.as_ref(),
        user,
        payload,
        form.image.take(),
    )
    .await?;

    Ok(Json(json!({ "userFound": user_found })))
}

// DELETE /users/{secureId} (admin)
pub async fn destroy(
    State(state): State<AppState>,
    AppPath(secure_id): AppPath<String>,
) -> AppResult<impl IntoResponse> {
    user_service::delete_user_by_secure_id(&state.db_pool, &secure_id).await?;
    Ok(Json(json!({ "message": "User deleted successfully!" })))
}

// POST /users/access_allow (admin)
pub async fn access_allow(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<AccessAllowPayload>,
) -> AppResult<impl IntoResponse> {
    let user = user_service::sync_user_roles(&state.db_pool, payload.user_id, &payload.roles).await?;
    Ok(Json(user))
}

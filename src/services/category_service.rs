// src/services/category_service.rs
use crate::{
    error::{AppError, AppResult, ResultExt, RowExt},
    models::{
        category::{Category, StoreCategoryPayload, UpdateCategoryPayload},
        pagination::{Listing, Page, PageMeta, PageRequest},
    },
};
use sqlx::SqlitePool;

pub async fn list_categories(
    db_pool: &SqlitePool,
    page: Option<PageRequest>,
) -> AppResult<Listing<Category>> {
    let Some(page) = page else {
        let all = sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name ASC")
            .fetch_all(db_pool)
            .await?;
        return Ok(Listing::All(all));
    };

    let data =
        sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name ASC LIMIT ?1 OFFSET ?2")
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(db_pool)
            .await?;
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
        .fetch_one(db_pool)
        .await?;

    Ok(Listing::Paged(Page {
        meta: PageMeta::new(total, page),
        data,
    }))
}

pub async fn find_category(db_pool: &SqlitePool, id: i64) -> AppResult<Category> {
    sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = ?1")
        .bind(id)
        .fetch_one(db_pool)
        .await
        .or_not_found("Category not found")
}

/// O nome é único na tabela; duplicados falham na constraint.
pub async fn create_category(
    db_pool: &SqlitePool,
    payload: &StoreCategoryPayload,
) -> AppResult<Category> {
    tracing::info!("Criando categoria {}", payload.name);
    sqlx::query_as::<_, Category>(
        "INSERT INTO categories (name, observation) VALUES (?1, ?2) RETURNING *",
    )
    .bind(payload.name.trim())
    .bind(payload.observation.as_deref().map(str::trim))
    .fetch_one(db_pool)
    .await
    .or_bad_request("Error in creating category")
}

pub async fn update_category(
    db_pool: &SqlitePool,
    id: i64,
    payload: &UpdateCategoryPayload,
) -> AppResult<Category> {
    tracing::info!("Atualizando categoria {}", id);
    // Garante 404 antes de tentar escrever
    find_category(db_pool, id).await?;

    sqlx::query_as::<_, Category>(
        r#"
        UPDATE categories
        SET
            name = COALESCE(?1, name),
            observation = COALESCE(?2, observation),
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ?3
        RETURNING *
        "#,
    )
    .bind(payload.name.as_deref().map(str::trim))
    .bind(payload.observation.as_deref().map(str::trim))
    .bind(id)
    .fetch_one(db_pool)
    .await
    .or_bad_request("Error in updating category")
}

pub async fn delete_category(db_pool: &SqlitePool, id: i64) -> AppResult<()> {
    tracing::info!("Removendo categoria {}", id);
    let rows_affected = sqlx::query("DELETE FROM categories WHERE id = ?1")
        .bind(id)
        .execute(db_pool)
        .await?
        .rows_affected();

    if rows_affected == 0 {
        return Err(AppError::not_found(
            "Category not found",
            format!("no category with id {}", id),
        ));
    }
    Ok(())
}

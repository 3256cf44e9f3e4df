// src/services/product_service.rs
use crate::{
    error::{AppError, AppResult, ResultExt, RowExt},
    models::{
        category::Category,
        pagination::{Listing, Page, PageMeta, PageRequest},
        product::{Product, ProductWithCategories, StoreProductPayload, UpdateProductPayload},
    },
};
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

async fn load_categories(conn: &mut SqliteConnection, product_id: i64) -> AppResult<Vec<Category>> {
    let categories = sqlx::query_as::<_, Category>(
        r#"
        SELECT c.*
        FROM categories c
        JOIN category_product cp ON cp.category_id = c.id
        WHERE cp.product_id = ?1
        ORDER BY c.name ASC
        "#,
    )
    .bind(product_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(categories)
}

async fn fetch_with_categories(
    conn: &mut SqliteConnection,
    product_id: i64,
) -> AppResult<ProductWithCategories> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?1")
        .bind(product_id)
        .fetch_one(&mut *conn)
        .await
        .or_not_found("Product not found")?;
    let categories = load_categories(conn, product.id).await?;
    Ok(ProductWithCategories {
        product,
        categories,
    })
}

/// Converte nomes em IDs. Nomes sem categoria correspondente são ignorados (com aviso).
pub async fn resolve_category_ids(
    conn: &mut SqliteConnection,
    names: &[String],
) -> AppResult<Vec<i64>> {
    let mut ids = Vec::with_capacity(names.len());
    for name in names {
        let name = name.trim();
        let found = sqlx::query_scalar::<_, i64>("SELECT id FROM categories WHERE name = ?1")
            .bind(name)
            .fetch_optional(&mut *conn)
            .await?;
        match found {
            Some(id) if !ids.contains(&id) => ids.push(id),
            Some(_) => {}
            None => tracing::warn!("Categoria desconhecida '{}' ignorada", name),
        }
    }
    Ok(ids)
}

async fn attach_categories(
    conn: &mut SqliteConnection,
    product_id: i64,
    category_ids: &[i64],
) -> Result<(), sqlx::Error> {
    for category_id in category_ids {
        sqlx::query(
            "INSERT OR IGNORE INTO category_product (category_id, product_id) VALUES (?1, ?2)",
        )
        .bind(*category_id)
        .bind(product_id)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Sync: o produto fica exatamente com estas categorias.
async fn sync_categories(
    conn: &mut SqliteConnection,
    product_id: i64,
    category_ids: &[i64],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM category_product WHERE product_id = ?1")
        .bind(product_id)
        .execute(&mut *conn)
        .await?;
    attach_categories(conn, product_id, category_ids).await
}

pub async fn list_products(
    db_pool: &SqlitePool,
    page: Option<PageRequest>,
) -> AppResult<Listing<ProductWithCategories>> {
    let products = match page {
        Some(page) => {
            sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY id ASC LIMIT ?1 OFFSET ?2")
                .bind(page.limit())
                .bind(page.offset())
                .fetch_all(db_pool)
                .await?
        }
        None => {
            sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY id ASC")
                .fetch_all(db_pool)
                .await?
        }
    };

    let mut conn = db_pool.acquire().await?;
    let mut data = Vec::with_capacity(products.len());
    for product in products {
        let categories = load_categories(&mut conn, product.id).await?;
        data.push(ProductWithCategories {
            product,
            categories,
        });
    }

    match page {
        None => Ok(Listing::All(data)),
        Some(page) => {
            let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
                .fetch_one(&mut *conn)
                .await?;
            Ok(Listing::Paged(Page {
                meta: PageMeta::new(total, page),
                data,
            }))
        }
    }
}

pub async fn find_product_by_secure_id(
    db_pool: &SqlitePool,
    secure_id: &str,
) -> AppResult<ProductWithCategories> {
    let mut conn = db_pool.acquire().await?;
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE secure_id = ?1")
        .bind(secure_id)
        .fetch_one(&mut *conn)
        .await
        .or_not_found("Product not found")?;
    let categories = load_categories(&mut conn, product.id).await?;
    Ok(ProductWithCategories {
        product,
        categories,
    })
}

pub async fn product_exists(db_pool: &SqlitePool, product_id: i64) -> AppResult<bool> {
    let found = sqlx::query_scalar::<_, i64>("SELECT id FROM products WHERE id = ?1")
        .bind(product_id)
        .fetch_optional(db_pool)
        .await?;
    Ok(found.is_some())
}

/// Cria o produto e liga as categorias, tudo na mesma transação.
pub async fn create_product(
    db_pool: &SqlitePool,
    payload: &StoreProductPayload,
) -> AppResult<ProductWithCategories> {
    tracing::info!("Criando produto {} ({})", payload.name, payload.code);
    let mut tx = db_pool.begin().await.or_bad_request("Error in create product")?;

    let product_id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO products (secure_id, name, code, price)
        VALUES (?1, ?2, ?3, ?4)
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(payload.name.trim())
    .bind(payload.code.trim())
    .bind(payload.price)
    .fetch_one(&mut *tx)
    .await
    .or_bad_request("Error in create product")?;

    let category_ids = resolve_category_ids(&mut tx, &payload.categories)
        .await
        .or_bad_request("Error in create product")?;
    attach_categories(&mut tx, product_id, &category_ids)
        .await
        .or_bad_request("Error in create product")?;

    let product = fetch_with_categories(&mut tx, product_id)
        .await
        .or_bad_request("Error in find product")?;

    tx.commit().await.or_bad_request("Error in create product")?;
    tracing::info!("✅ Produto {} criado.", product.product.secure_id);
    Ok(product)
}

/// Atualização parcial; `categories`, quando enviado, substitui o conjunto inteiro.
pub async fn update_product(
    db_pool: &SqlitePool,
    secure_id: &str,
    payload: &UpdateProductPayload,
) -> AppResult<ProductWithCategories> {
    tracing::info!("Atualizando produto {}", secure_id);
    let mut tx = db_pool.begin().await.or_bad_request("Error in update products")?;

    let product_id = sqlx::query_scalar::<_, i64>("SELECT id FROM products WHERE secure_id = ?1")
        .bind(secure_id)
        .fetch_one(&mut *tx)
        .await
        .or_not_found("Product not found")?;

    if let Some(names) = &payload.categories {
        let category_ids = resolve_category_ids(&mut tx, names)
            .await
            .or_bad_request("Error in update products")?;
        sync_categories(&mut tx, product_id, &category_ids)
            .await
            .or_bad_request("Error in update products")?;
    }

    sqlx::query(
        r#"
        UPDATE products
        SET
            name = COALESCE(?1, name),
            code = COALESCE(?2, code),
            price = COALESCE(?3, price),
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ?4
        "#,
    )
    .bind(payload.name.as_deref().map(str::trim))
    .bind(payload.code.as_deref().map(str::trim))
    .bind(payload.price)
    .bind(product_id)
    .execute(&mut *tx)
    .await
    .or_bad_request("Error in update products")?;

    let product = fetch_with_categories(&mut tx, product_id)
        .await
        .or_bad_request("Error in find product")?;

    tx.commit().await.or_bad_request("Error in update products")?;
    Ok(product)
}

pub async fn delete_product(db_pool: &SqlitePool, secure_id: &str) -> AppResult<()> {
    tracing::info!("Removendo produto {}", secure_id);
    let rows_affected = sqlx::query("DELETE FROM products WHERE secure_id = ?1")
        .bind(secure_id)
        .execute(db_pool)
        .await?
        .rows_affected();

    if rows_affected == 0 {
        return Err(AppError::not_found(
            "Product not found",
            format!("no product with secure id {}", secure_id),
        ));
    }
    Ok(())
}

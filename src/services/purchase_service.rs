// src/services/purchase_service.rs
use crate::{
    error::{AppError, AppResult, RowExt},
    models::{
        cart::{round_cents, CartItemRow},
        pagination::{Listing, Page, PageMeta, PageRequest},
        purchase::Purchase,
    },
};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Checkout de uma linha do carrinho: copia produto, preço e quantidade para
/// `purchases` e apaga a linha do carrinho, na mesma transação.
pub async fn create_purchase(
    db_pool: &SqlitePool,
    user_id: i64,
    cart_id: i64,
) -> AppResult<Purchase> {
    tracing::info!("Checkout do carrinho {} pelo user {}", cart_id, user_id);
    let mut tx = db_pool.begin().await?;

    // Só o dono do carrinho o pode comprar; para os outros a linha "não existe"
    let row = sqlx::query_as::<_, CartItemRow>(
        r#"
        SELECT
            c.id, c.user_id, c.product_id, c.quantity, c.created_at, c.updated_at,
            u.name AS user_name, u.email AS user_email,
            p.name AS product_name, p.code AS product_code, p.price AS product_price
        FROM carts c
        JOIN users u ON u.id = c.user_id
        JOIN products p ON p.id = c.product_id
        WHERE c.id = ?1 AND c.user_id = ?2
        "#,
    )
    .bind(cart_id)
    .bind(user_id)
    .fetch_one(&mut *tx)
    .await
    .or_not_found("Cart item not found")?;

    let total_price = round_cents(row.product_price * row.quantity as f64);

    let purchase = sqlx::query_as::<_, Purchase>(
        r#"
        INSERT INTO purchases
            (secure_id, user_id, cart_id, product_id, product_name, product_code,
             unit_price, quantity, total_price)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(row.user_id)
    .bind(row.id)
    .bind(row.product_id)
    .bind(&row.product_name)
    .bind(&row.product_code)
    .bind(row.product_price)
    .bind(row.quantity)
    .bind(total_price)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM carts WHERE id = ?1")
        .bind(row.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    tracing::info!(
        "✅ Compra {} registada: {} x {} = {:.2}",
        purchase.secure_id,
        purchase.quantity,
        purchase.product_code,
        purchase.total_price
    );
    Ok(purchase)
}

pub async fn list_purchases(
    db_pool: &SqlitePool,
    user_id: i64,
    page: Option<PageRequest>,
) -> AppResult<Listing<Purchase>> {
    let Some(page) = page else {
        let all = sqlx::query_as::<_, Purchase>(
            "SELECT * FROM purchases WHERE user_id = ?1 ORDER BY id DESC",
        )
        .bind(user_id)
        .fetch_all(db_pool)
        .await?;
        return Ok(Listing::All(all));
    };

    let data = sqlx::query_as::<_, Purchase>(
        "SELECT * FROM purchases WHERE user_id = ?1 ORDER BY id DESC LIMIT ?2 OFFSET ?3",
    )
    .bind(user_id)
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(db_pool)
    .await?;
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM purchases WHERE user_id = ?1")
        .bind(user_id)
        .fetch_one(db_pool)
        .await?;

    Ok(Listing::Paged(Page {
        meta: PageMeta::new(total, page),
        data,
    }))
}

pub async fn find_purchase(db_pool: &SqlitePool, user_id: i64, secure_id: &str) -> AppResult<Purchase> {
    let purchase = sqlx::query_as::<_, Purchase>(
        "SELECT * FROM purchases WHERE secure_id = ?1 AND user_id = ?2",
    )
    .bind(secure_id)
    .bind(user_id)
    .fetch_optional(db_pool)
    .await?;

    purchase.ok_or_else(|| {
        AppError::not_found(
            "Purchase not found",
            format!("no purchase {} for this user", secure_id),
        )
    })
}

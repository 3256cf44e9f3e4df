// src/services/cart_service.rs
use crate::{
    error::{AppError, AppResult, RowExt},
    models::cart::{
        Cart, CartInfo, CartItem, CartItemRow, QuantityAdjustment, StoreCartPayload, MAX_CART_QUANTITY,
    },
    services::product_service,
};
use sqlx::SqlitePool;
use validator::{ValidationError, ValidationErrors};

const CART_ITEM_SELECT: &str = r#"
    SELECT
        c.id, c.user_id, c.product_id, c.quantity, c.created_at, c.updated_at,
        u.name AS user_name, u.email AS user_email,
        p.name AS product_name, p.code AS product_code, p.price AS product_price
    FROM carts c
    JOIN users u ON u.id = c.user_id
    JOIN products p ON p.id = c.product_id
"#;

/// Itens do carrinho do utilizador e o resumo (total e número de linhas).
pub async fn list_cart(db_pool: &SqlitePool, user_id: i64) -> AppResult<(CartInfo, Vec<CartItem>)> {
    tracing::debug!("Carregando carrinho do user {}", user_id);
    let sql = format!("{} WHERE c.user_id = ?1 ORDER BY c.id ASC", CART_ITEM_SELECT);
    let items: Vec<CartItem> = sqlx::query_as::<_, CartItemRow>(&sql)
        .bind(user_id)
        .fetch_all(db_pool)
        .await?
        .into_iter()
        .map(CartItem::from)
        .collect();

    let info = CartInfo::from_items(&items);
    Ok((info, items))
}

pub async fn find_cart_item(
    db_pool: &SqlitePool,
    user_id: i64,
    product_id: i64,
) -> AppResult<CartItem> {
    let sql = format!("{} WHERE c.user_id = ?1 AND c.product_id = ?2", CART_ITEM_SELECT);
    let row = sqlx::query_as::<_, CartItemRow>(&sql)
        .bind(user_id)
        .bind(product_id)
        .fetch_one(db_pool)
        .await
        .or_not_found("Cart item not found")?;
    Ok(CartItem::from(row))
}

/// Adiciona um produto ao carrinho. A unicidade (user, produto) é da base de dados:
/// se o INSERT não devolver linha, o produto já lá estava.
pub async fn add_to_cart(
    db_pool: &SqlitePool,
    user_id: i64,
    payload: &StoreCartPayload,
) -> AppResult<Cart> {
    if !product_service::product_exists(db_pool, payload.product_id).await? {
        let mut errors = ValidationErrors::new();
        errors.add(
            "product_id",
            ValidationError::new("exists").with_message("Product does not exist".into()),
        );
        return Err(AppError::Validation(errors));
    }

    let inserted = sqlx::query_as::<_, Cart>(
        r#"
        INSERT INTO carts (user_id, product_id, quantity)
        VALUES (?1, ?2, ?3)
        ON CONFLICT (user_id, product_id) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(payload.product_id)
    .bind(payload.quantity)
    .fetch_optional(db_pool)
    .await?;

    match inserted {
        Some(cart) => {
            tracing::info!(
                "🛒 Produto {} adicionado ao carrinho do user {} (qtd {})",
                payload.product_id,
                user_id,
                payload.quantity
            );
            Ok(cart)
        }
        None => {
            tracing::warn!(
                "Produto {} já está no carrinho do user {}",
                payload.product_id,
                user_id
            );
            Err(AppError::bad_request("This product is already in your cart."))
        }
    }
}

/// Aplica o ajuste numa única instrução SQL (sem ler-depois-escrever).
/// A quantidade nunca desce abaixo de 1: para isso existe o DELETE.
pub async fn adjust_quantity(
    db_pool: &SqlitePool,
    user_id: i64,
    product_id: i64,
    adjustment: Option<QuantityAdjustment>,
) -> AppResult<Cart> {
    let updated = match adjustment {
        None => {
            // Nenhuma flag verdadeira: devolve o item tal como está
            sqlx::query_as::<_, Cart>("SELECT * FROM carts WHERE user_id = ?1 AND product_id = ?2")
                .bind(user_id)
                .bind(product_id)
                .fetch_optional(db_pool)
                .await?
        }
        Some(QuantityAdjustment::Increment) => {
            sqlx::query_as::<_, Cart>(
                r#"
                UPDATE carts SET quantity = quantity + 1, updated_at = CURRENT_TIMESTAMP
                WHERE user_id = ?1 AND product_id = ?2 AND quantity < ?3
                RETURNING *
                "#,
            )
            .bind(user_id)
            .bind(product_id)
            .bind(MAX_CART_QUANTITY)
            .fetch_optional(db_pool)
            .await?
        }
        Some(QuantityAdjustment::Decrement) => {
            sqlx::query_as::<_, Cart>(
                r#"
                UPDATE carts SET quantity = quantity - 1, updated_at = CURRENT_TIMESTAMP
                WHERE user_id = ?1 AND product_id = ?2 AND quantity > 1
                RETURNING *
                "#,
            )
            .bind(user_id)
            .bind(product_id)
            .fetch_optional(db_pool)
            .await?
        }
        Some(QuantityAdjustment::Set(quantity)) => {
            sqlx::query_as::<_, Cart>(
                r#"
                UPDATE carts SET quantity = ?3, updated_at = CURRENT_TIMESTAMP
                WHERE user_id = ?1 AND product_id = ?2
                RETURNING *
                "#,
            )
            .bind(user_id)
            .bind(product_id)
            .bind(quantity)
            .fetch_optional(db_pool)
            .await?
        }
    };

    if let Some(cart) = updated {
        tracing::info!(
            "Carrinho do user {}: produto {} agora com {} unidade(s)",
            user_id,
            product_id,
            cart.quantity
        );
        return Ok(cart);
    }

    // Nada atualizado: ou a linha não existe, ou o ajuste sairia do intervalo 1..=MAX
    let exists = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM carts WHERE user_id = ?1 AND product_id = ?2",
    )
    .bind(user_id)
    .bind(product_id)
    .fetch_optional(db_pool)
    .await?
    .is_some();

    if !exists {
        return Err(AppError::not_found(
            "Cart item not found",
            sqlx::Error::RowNotFound,
        ));
    }

    if adjustment == Some(QuantityAdjustment::Increment) {
        Err(AppError::bad_request(format!(
            "Quantity cannot exceed {}.",
            MAX_CART_QUANTITY
        )))
    } else {
        Err(AppError::bad_request(
            "Quantity cannot go below 1. Remove the item instead.",
        ))
    }
}

pub async fn remove_from_cart(db_pool: &SqlitePool, user_id: i64, product_id: i64) -> AppResult<()> {
    let rows_affected = sqlx::query("DELETE FROM carts WHERE user_id = ?1 AND product_id = ?2")
        .bind(user_id)
        .bind(product_id)
        .execute(db_pool)
        .await?
        .rows_affected();

    if rows_affected == 0 {
        return Err(AppError::not_found(
            "Cart item not found",
            sqlx::Error::RowNotFound,
        ));
    }
    tracing::info!("Produto {} removido do carrinho do user {}", product_id, user_id);
    Ok(())
}

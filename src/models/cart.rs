// src/models/cart.rs
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

/// Teto de unidades de um produto no carrinho.
pub const MAX_CART_QUANTITY: i64 = 10_000;

// Linha da tabela 'carts' (única por utilizador + produto)
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct CartUser {
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CartProduct {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub price: f64,
}

/// Item do carrinho com utilizador e produto pré-carregados.
#[derive(Debug, Clone, Serialize)]
pub struct CartItem {
    #[serde(flatten)]
    pub cart: Cart,
    pub user: CartUser,
    pub product: CartProduct,
}

impl CartItem {
    pub fn subtotal(&self) -> f64 {
        round_cents(self.product.price * self.cart.quantity as f64)
    }
}

// Resultado do JOIN carts + users + products, antes de montar o CartItem
#[derive(Debug, FromRow)]
pub struct CartItemRow {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub user_name: String,
    pub user_email: String,
    pub product_name: String,
    pub product_code: String,
    pub product_price: f64,
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        CartItem {
            cart: Cart {
                id: row.id,
                user_id: row.user_id,
                product_id: row.product_id,
                quantity: row.quantity,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            user: CartUser {
                id: row.user_id,
                name: row.user_name,
                email: row.user_email,
            },
            product: CartProduct {
                id: row.product_id,
                name: row.product_name,
                code: row.product_code,
                price: row.product_price,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CartInfo {
    pub items_quantity: usize,
    pub total_price: f64,
}

impl CartInfo {
    /// Total calculado na leitura: soma de preço unitário × quantidade.
    pub fn from_items(items: &[CartItem]) -> Self {
        let total: f64 = items
            .iter()
            .map(|item| item.product.price * item.cart.quantity as f64)
            .sum();
        CartInfo {
            items_quantity: items.len(),
            total_price: round_cents(total),
        }
    }
}

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Deserialize, Validate)]
pub struct StoreCartPayload {
    #[validate(range(min = 1))]
    pub product_id: i64,
    #[validate(range(
        min = 1,
        max = MAX_CART_QUANTITY,
        message = "Quantity must be between 1 and 10000"
    ))]
    pub quantity: i64,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_adjustment"))]
pub struct UpdateCartPayload {
    pub add_one_item: Option<bool>,
    pub remove_one_item: Option<bool>,
    #[validate(range(
        min = 1,
        max = MAX_CART_QUANTITY,
        message = "Quantity must be between 1 and 10000"
    ))]
    pub set_item_quantity: Option<i64>,
}

// setItemQuantity é obrigatório quando nenhuma das flags foi enviada
fn validate_adjustment(payload: &UpdateCartPayload) -> Result<(), ValidationError> {
    if payload.add_one_item.is_none()
        && payload.remove_one_item.is_none()
        && payload.set_item_quantity.is_none()
    {
        return Err(ValidationError::new("required_if_not_exists_all").with_message(
            "setItemQuantity is required when addOneItem and removeOneItem are absent".into(),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityAdjustment {
    Increment,
    Decrement,
    Set(i64),
}

impl UpdateCartPayload {
    /// Primeiro valor verdadeiro ganha: adicionar, depois remover, depois fixar.
    pub fn adjustment(&self) -> Option<QuantityAdjustment> {
        if self.add_one_item == Some(true) {
            Some(QuantityAdjustment::Increment)
        } else if self.remove_one_item == Some(true) {
            Some(QuantityAdjustment::Decrement)
        } else {
            self.set_item_quantity.map(QuantityAdjustment::Set)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(add: Option<bool>, remove: Option<bool>, set: Option<i64>) -> UpdateCartPayload {
        UpdateCartPayload {
            add_one_item: add,
            remove_one_item: remove,
            set_item_quantity: set,
        }
    }

    #[test]
    fn first_truthy_flag_wins() {
        assert_eq!(
            payload(Some(true), Some(true), Some(9)).adjustment(),
            Some(QuantityAdjustment::Increment)
        );
        assert_eq!(
            payload(Some(false), Some(true), Some(9)).adjustment(),
            Some(QuantityAdjustment::Decrement)
        );
        assert_eq!(
            payload(Some(false), None, Some(5)).adjustment(),
            Some(QuantityAdjustment::Set(5))
        );
        assert_eq!(payload(Some(false), Some(false), None).adjustment(), None);
    }

    #[test]
    fn set_quantity_required_without_flags() {
        assert!(payload(None, None, None).validate().is_err());
        assert!(payload(None, None, Some(5)).validate().is_ok());
        assert!(payload(Some(false), None, None).validate().is_ok());
        assert!(payload(None, None, Some(MAX_CART_QUANTITY)).validate().is_ok());
        assert!(payload(None, None, Some(MAX_CART_QUANTITY + 1)).validate().is_err());
        assert!(payload(None, None, Some(0)).validate().is_err());
    }

    #[test]
    fn totals_sum_price_times_quantity() {
        let now = chrono::Utc::now().naive_utc();
        let item = |id: i64, price: f64, quantity: i64| CartItem {
            cart: Cart {
                id,
                user_id: 1,
                product_id: id,
                quantity,
                created_at: now,
                updated_at: now,
            },
            user: CartUser {
                id: 1,
                name: "Client".into(),
                email: "client@email.com".into(),
            },
            product: CartProduct {
                id,
                name: format!("p{id}"),
                code: format!("c{id}"),
                price,
            },
        };
        let items = vec![item(1, 10.5, 2), item(2, 3.25, 4), item(3, 0.1, 3)];
        let info = CartInfo::from_items(&items);
        assert_eq!(info.items_quantity, 3);
        assert_eq!(info.total_price, 34.3);
        assert_eq!(items[0].subtotal(), 21.0);
        assert_eq!(CartInfo::from_items(&[]).total_price, 0.0);
    }
}

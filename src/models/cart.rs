//! Cart domain models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::product::Product;

/// Cart row
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Cart row with its product embedded
#[derive(Debug, Clone, Serialize)]
pub struct CartItemDetail {
    #[serde(flatten)]
    pub item: CartItem,
    pub product: Product,
}

/// Paginated cart listing with the subtotal of the whole cart
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartList {
    pub cart_items: Vec<CartItemDetail>,
    pub pagination: crate::pagination::Pagination,
    pub subtotal: Decimal,
}

/// Add-to-cart request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCartRequest {
    #[serde(default)]
    #[validate(range(min = 1, message = "Product id must be at least 1"))]
    pub product_id: i64,

    #[serde(default)]
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
}

/// Cart quantity update
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCartRequest {
    #[serde(default)]
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
}

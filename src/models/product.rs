//! Product domain models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::category::Category;
use crate::services::storage_service::UploadedFile;

/// Product row
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub seller_id: i64,
    pub category_id: Option<i64>,
    pub name: String,
    #[serde(rename = "desc")]
    pub description: Option<String>,
    pub regular_price: Option<Decimal>,
    pub sell_price: Decimal,
    pub stock: i32,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Feature image row
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
    pub id: i64,
    pub product_id: i64,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}

/// Public view of the seller
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Seller {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// Product with category, images and (on detail reads) the seller
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seller: Option<Seller>,
    pub images: Vec<ProductImage>,
}

/// Paginated product listing
#[derive(Debug, Serialize)]
pub struct ProductList {
    pub products: Vec<ProductDetail>,
    pub pagination: crate::pagination::Pagination,
}

/// Validated multipart input for creating a product
#[derive(Debug)]
pub struct CreateProductInput {
    pub name: String,
    pub category_id: Option<i64>,
    pub description: Option<String>,
    pub regular_price: Option<Decimal>,
    pub sell_price: Decimal,
    pub stock: i32,
    pub main_image: UploadedFile,
    pub feature_images: Vec<UploadedFile>,
}

/// Validated multipart input for updating a product; `None` keeps the current value
#[derive(Debug, Default)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub category_id: Option<i64>,
    pub description: Option<String>,
    pub regular_price: Option<Decimal>,
    pub sell_price: Option<Decimal>,
    pub stock: Option<i32>,
    pub main_image: Option<UploadedFile>,
}

/// Row values for an insert
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub seller_id: i64,
    pub category_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub regular_price: Option<Decimal>,
    pub sell_price: Decimal,
    pub stock: i32,
    pub image_url: String,
}

/// Column changes for an update; `None` keeps the current value
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub category_id: Option<i64>,
    pub description: Option<String>,
    pub regular_price: Option<Decimal>,
    pub sell_price: Option<Decimal>,
    pub stock: Option<i32>,
    pub image_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_product_serializes_prices_as_strings() {
        let now = Utc::now();
        let product = Product {
            id: 1,
            seller_id: 2,
            category_id: None,
            name: "Mug".to_string(),
            description: Some("Ceramic".to_string()),
            regular_price: Some(Decimal::from_str("12.50").unwrap()),
            sell_price: Decimal::from_str("9.99").unwrap(),
            stock: 3,
            image_url: Some("uploads/products/1-1.png".to_string()),
            created_at: now,
            updated_at: now,
        };

        let value = serde_json::to_value(ProductDetail {
            product,
            category: None,
            seller: None,
            images: vec![],
        })
        .unwrap();

        assert_eq!(value["sellPrice"], "9.99");
        assert_eq!(value["regularPrice"], "12.50");
        assert_eq!(value["desc"], "Ceramic");
        assert_eq!(value["sellerId"], 2);
        assert!(value.get("seller").is_none());
        assert!(value["category"].is_null());
    }
}

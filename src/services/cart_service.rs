//! 购物车服务
//!
//! 库存只做读取校验，数据库 CHECK 约束兜底。

use crate::{
    error::{map_unique_violation, AppError},
    models::cart::*,
    repository::{cart_repo::CartRepository, product_repo::ProductRepository},
};
use rust_decimal::Decimal;
use sqlx::PgPool;

const ALREADY_IN_CART: &str = "Product already exists in cart";

pub struct CartService {
    db: PgPool,
}

impl CartService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    fn repo(&self) -> CartRepository {
        CartRepository::new(self.db.clone())
    }

    pub async fn add(&self, user_id: i64, req: CreateCartRequest) -> Result<CartItem, AppError> {
        let product = ProductRepository::new(self.db.clone())
            .find_by_id(req.product_id)
            .await?
            .ok_or_else(|| AppError::field("productId", "Invalid product ID"))?;

        check_stock(product.stock, req.quantity)?;

        let repo = self.repo();
        if repo.find_by_product(user_id, req.product_id).await?.is_some() {
            return Err(AppError::field("productId", ALREADY_IN_CART));
        }

        let item = repo
            .create(user_id, req.product_id, req.quantity)
            .await
            .map_err(|e| map_unique_violation(e, ALREADY_IN_CART))?;

        tracing::info!(user_id, product_id = req.product_id, quantity = req.quantity, "Cart item added");
        Ok(item)
    }

    pub async fn update(
        &self,
        user_id: i64,
        cart_id: i64,
        req: UpdateCartRequest,
    ) -> Result<CartItem, AppError> {
        let repo = self.repo();
        let item = repo
            .find_for_user(user_id, cart_id)
            .await?
            .ok_or_else(|| AppError::not_found("Cart item not found"))?;

        let product = ProductRepository::new(self.db.clone())
            .find_by_id(item.product_id)
            .await?
            .ok_or_else(|| AppError::field("productId", "Invalid product ID"))?;

        check_stock(product.stock, req.quantity)?;

        let updated = repo
            .update_quantity(user_id, cart_id, req.quantity)
            .await?
            .ok_or_else(|| AppError::not_found("Cart item not found"))?;

        tracing::info!(user_id, cart_id, quantity = req.quantity, "Cart item updated");
        Ok(updated)
    }

    /// 当前页的条目 + 整个购物车的小计
    pub async fn list(
        &self,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<CartItemDetail>, i64, Decimal), AppError> {
        let repo = self.repo();
        let total = repo.count(user_id).await?;
        let items = repo.list(user_id, limit, offset).await?;

        if items.is_empty() {
            return Err(AppError::not_found("Cart is empty"));
        }

        let product_ids: Vec<i64> = items.iter().map(|i| i.product_id).collect();
        let mut products = ProductRepository::new(self.db.clone())
            .find_by_ids(&product_ids)
            .await?;

        // 商品删除会级联删除购物车行，这里缺失只可能是并发删除
        let details = items
            .into_iter()
            .filter_map(|item| {
                products
                    .remove(&item.product_id)
                    .map(|product| CartItemDetail { item, product })
            })
            .collect();

        let subtotal = repo.subtotal(user_id).await?;

        Ok((details, total, subtotal))
    }

    pub async fn remove(&self, user_id: i64, cart_id: i64) -> Result<(), AppError> {
        if !self.repo().remove(user_id, cart_id).await? {
            return Err(AppError::not_found("Cart item not found"));
        }
        tracing::info!(user_id, cart_id, "Cart item removed");
        Ok(())
    }

    pub async fn clear(&self, user_id: i64) -> Result<u64, AppError> {
        let removed = self.repo().clear(user_id).await?;
        tracing::info!(user_id, removed, "Cart cleared");
        Ok(removed)
    }
}

fn check_stock(stock: i32, quantity: i32) -> Result<(), AppError> {
    if stock < quantity {
        return Err(AppError::field(
            "quantity",
            format!("Only {} item(s) available in stock", stock),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_stock() {
        assert!(check_stock(5, 5).is_ok());

        let err = check_stock(2, 3).unwrap_err();
        assert_eq!(err.code(), 400);
        let errors = err.field_errors().unwrap();
        assert_eq!(errors[0].field, "quantity");
        assert_eq!(errors[0].message, "Only 2 item(s) available in stock");
    }
}

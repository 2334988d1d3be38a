//! Cart repository (购物车数据访问)
//!
//! 所有读写都带 `user_id` 条件，调用方只能操作自己的购物车。

use crate::{error::AppError, models::cart::CartItem};
use rust_decimal::Decimal;
use sqlx::PgPool;

pub struct CartRepository {
    db: PgPool,
}

impl CartRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn find_for_user(
        &self,
        user_id: i64,
        cart_id: i64,
    ) -> Result<Option<CartItem>, AppError> {
        let item = sqlx::query_as::<_, CartItem>(
            "SELECT * FROM carts WHERE id = $1 AND user_id = $2",
        )
        .bind(cart_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(item)
    }

    pub async fn find_by_product(
        &self,
        user_id: i64,
        product_id: i64,
    ) -> Result<Option<CartItem>, AppError> {
        let item = sqlx::query_as::<_, CartItem>(
            "SELECT * FROM carts WHERE user_id = $1 AND product_id = $2",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(item)
    }

    pub async fn create(
        &self,
        user_id: i64,
        product_id: i64,
        quantity: i32,
    ) -> Result<CartItem, sqlx::Error> {
        sqlx::query_as::<_, CartItem>(
            r#"
            INSERT INTO carts (user_id, product_id, quantity)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .fetch_one(&self.db)
        .await
    }

    pub async fn update_quantity(
        &self,
        user_id: i64,
        cart_id: i64,
        quantity: i32,
    ) -> Result<Option<CartItem>, AppError> {
        let item = sqlx::query_as::<_, CartItem>(
            r#"
            UPDATE carts
            SET quantity = $3, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(cart_id)
        .bind(user_id)
        .bind(quantity)
        .fetch_optional(&self.db)
        .await?;

        Ok(item)
    }

    pub async fn remove(&self, user_id: i64, cart_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM carts WHERE id = $1 AND user_id = $2")
            .bind(cart_id)
            .bind(user_id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn clear(&self, user_id: i64) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM carts WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn list(
        &self,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CartItem>, AppError> {
        let items = sqlx::query_as::<_, CartItem>(
            r#"
            SELECT * FROM carts
            WHERE user_id = $1
            ORDER BY id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        Ok(items)
    }

    pub async fn count(&self, user_id: i64) -> Result<i64, AppError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM carts WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.db)
            .await?;

        Ok(total)
    }

    /// 整个购物车的小计：sell_price * quantity 之和
    pub async fn subtotal(&self, user_id: i64) -> Result<Decimal, AppError> {
        let subtotal: Decimal = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(p.sell_price * c.quantity), 0)
            FROM carts c
            JOIN products p ON p.id = c.product_id
            WHERE c.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        Ok(subtotal)
    }
}

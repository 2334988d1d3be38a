//! Product repository (商品数据访问)

use crate::{
    error::AppError,
    models::{category::Category, product::*},
};
use sqlx::PgPool;
use std::collections::HashMap;

pub struct ProductRepository {
    db: PgPool,
}

impl ProductRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(product)
    }

    /// 按 ID 批量读取
    pub async fn find_by_ids(&self, ids: &[i64]) -> Result<HashMap<i64, Product>, AppError> {
        let products = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.db)
            .await?;

        Ok(products.into_iter().map(|p| (p.id, p)).collect())
    }

    /// 在同一事务中写入商品与特性图
    pub async fn create_with_images(
        &self,
        product: &NewProduct,
        feature_image_urls: &[String],
    ) -> Result<(Product, Vec<ProductImage>), AppError> {
        let mut tx = self.db.begin().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to begin transaction");
            AppError::Database(e)
        })?;

        let created = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (
                seller_id, category_id, name, description,
                regular_price, sell_price, stock, image_url
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(product.seller_id)
        .bind(product.category_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.regular_price)
        .bind(product.sell_price)
        .bind(product.stock)
        .bind(&product.image_url)
        .fetch_one(&mut *tx)
        .await?;

        let images = sqlx::query_as::<_, ProductImage>(
            r#"
            INSERT INTO product_images (product_id, image_url)
            SELECT $1, UNNEST($2::TEXT[])
            RETURNING *
            "#,
        )
        .bind(created.id)
        .bind(feature_image_urls)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to commit transaction");
            AppError::Database(e)
        })?;

        Ok((created, images))
    }

    pub async fn update(
        &self,
        id: i64,
        changes: &ProductChanges,
    ) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET
                name = COALESCE($2, name),
                category_id = COALESCE($3, category_id),
                description = COALESCE($4, description),
                regular_price = COALESCE($5, regular_price),
                sell_price = COALESCE($6, sell_price),
                stock = COALESCE($7, stock),
                image_url = COALESCE($8, image_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&changes.name)
        .bind(changes.category_id)
        .bind(&changes.description)
        .bind(changes.regular_price)
        .bind(changes.sell_price)
        .bind(changes.stock)
        .bind(&changes.image_url)
        .fetch_optional(&self.db)
        .await?;

        Ok(product)
    }

    pub async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Product>, AppError> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products ORDER BY id LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        Ok(products)
    }

    pub async fn count(&self) -> Result<i64, AppError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.db)
            .await?;

        Ok(total)
    }

    // ==================== Images ====================

    pub async fn add_images(
        &self,
        product_id: i64,
        image_urls: &[String],
    ) -> Result<Vec<ProductImage>, AppError> {
        let images = sqlx::query_as::<_, ProductImage>(
            r#"
            INSERT INTO product_images (product_id, image_url)
            SELECT $1, UNNEST($2::TEXT[])
            RETURNING *
            "#,
        )
        .bind(product_id)
        .bind(image_urls)
        .fetch_all(&self.db)
        .await?;

        Ok(images)
    }

    /// 一组商品的特性图，按商品 ID 分组
    pub async fn images_for(
        &self,
        product_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<ProductImage>>, AppError> {
        let images = sqlx::query_as::<_, ProductImage>(
            "SELECT * FROM product_images WHERE product_id = ANY($1) ORDER BY id",
        )
        .bind(product_ids)
        .fetch_all(&self.db)
        .await?;

        let mut grouped: HashMap<i64, Vec<ProductImage>> = HashMap::new();
        for image in images {
            grouped.entry(image.product_id).or_default().push(image);
        }

        Ok(grouped)
    }

    /// 一组分类，按 ID 索引
    pub async fn categories_for(
        &self,
        category_ids: &[i64],
    ) -> Result<HashMap<i64, Category>, AppError> {
        let categories =
            sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = ANY($1)")
                .bind(category_ids)
                .fetch_all(&self.db)
                .await?;

        Ok(categories.into_iter().map(|c| (c.id, c)).collect())
    }

    pub async fn find_seller(&self, seller_id: i64) -> Result<Option<Seller>, AppError> {
        let seller =
            sqlx::query_as::<_, Seller>("SELECT id, name, email FROM users WHERE id = $1")
                .bind(seller_id)
                .fetch_optional(&self.db)
                .await?;

        Ok(seller)
    }
}

//! Category repository (分类数据访问)

use crate::{error::AppError, models::category::*};
use sqlx::PgPool;
use std::collections::HashMap;

pub struct CategoryRepository {
    db: PgPool,
}

impl CategoryRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Category>, AppError> {
        let category = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(category)
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<Category>, AppError> {
        let category = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.db)
            .await?;

        Ok(category)
    }

    pub async fn exists(&self, id: i64) -> Result<bool, AppError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.db)
                .await?;

        Ok(exists)
    }

    pub async fn create(
        &self,
        name: &str,
        parent_id: Option<i64>,
        image_url: Option<&str>,
    ) -> Result<Category, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name, parent_id, image_url)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(parent_id)
        .bind(image_url)
        .fetch_one(&self.db)
        .await
    }

    pub async fn update(
        &self,
        id: i64,
        changes: &CategoryChanges,
    ) -> Result<Option<Category>, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories
            SET
                name = $2,
                parent_id = $3,
                image_url = $4,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&changes.name)
        .bind(changes.parent_id)
        .bind(&changes.image_url)
        .fetch_optional(&self.db)
        .await
    }

    /// 分页列出顶级分类
    pub async fn list_top_level(&self, limit: i64, offset: i64) -> Result<Vec<Category>, AppError> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT * FROM categories
            WHERE parent_id IS NULL
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        Ok(categories)
    }

    /// 顶级分类总数（与 list_top_level 同一过滤条件）
    pub async fn count_top_level(&self) -> Result<i64, AppError> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM categories WHERE parent_id IS NULL")
                .fetch_one(&self.db)
                .await?;

        Ok(total)
    }

    /// 一组分类的直接子分类，按父 ID 分组
    pub async fn children_of(
        &self,
        parent_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<Category>>, AppError> {
        let children = sqlx::query_as::<_, Category>(
            "SELECT * FROM categories WHERE parent_id = ANY($1) ORDER BY id",
        )
        .bind(parent_ids)
        .fetch_all(&self.db)
        .await?;

        let mut grouped: HashMap<i64, Vec<Category>> = HashMap::new();
        for child in children {
            if let Some(parent_id) = child.parent_id {
                grouped.entry(parent_id).or_default().push(child);
            }
        }

        Ok(grouped)
    }

    /// 分类及其全部后代的图片路径（删除时级联清理文件）
    pub async fn subtree_image_urls(&self, id: i64) -> Result<Vec<String>, AppError> {
        let urls: Vec<String> = sqlx::query_scalar(
            r#"
            WITH RECURSIVE subtree AS (
                SELECT id, image_url FROM categories WHERE id = $1
                UNION ALL
                SELECT c.id, c.image_url
                FROM categories c
                JOIN subtree s ON c.parent_id = s.id
            )
            SELECT image_url FROM subtree WHERE image_url IS NOT NULL
            "#,
        )
        .bind(id)
        .fetch_all(&self.db)
        .await?;

        Ok(urls)
    }

    /// `candidate` 是否是 `id` 的后代（防止形成环）
    pub async fn is_descendant(&self, id: i64, candidate: i64) -> Result<bool, AppError> {
        let found: bool = sqlx::query_scalar(
            r#"
            WITH RECURSIVE subtree AS (
                SELECT id FROM categories WHERE parent_id = $1
                UNION
                SELECT c.id
                FROM categories c
                JOIN subtree s ON c.parent_id = s.id
            )
            SELECT EXISTS(SELECT 1 FROM subtree WHERE id = $2)
            "#,
        )
        .bind(id)
        .bind(candidate)
        .fetch_one(&self.db)
        .await?;

        Ok(found)
    }

    pub async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

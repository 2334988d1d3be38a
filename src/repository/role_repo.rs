//! Role repository (角色与权限数据访问)

use crate::{error::AppError, models::role::*};
use sqlx::PgPool;
use std::collections::HashMap;

pub struct RoleRepository {
    db: PgPool,
}

impl RoleRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    // ==================== Roles ====================

    /// 分页列出角色
    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Role>, AppError> {
        let roles = sqlx::query_as::<_, Role>(
            "SELECT * FROM roles ORDER BY id LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        Ok(roles)
    }

    pub async fn count(&self) -> Result<i64, AppError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM roles")
            .fetch_one(&self.db)
            .await?;

        Ok(total)
    }

    /// 根据名称查找角色
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Role>, AppError> {
        let role = sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.db)
            .await?;

        Ok(role)
    }

    /// 根据 ID 查找角色
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Role>, AppError> {
        let role = sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(role)
    }

    /// 创建角色
    pub async fn create(&self, name: &str, description: Option<&str>) -> Result<Role, sqlx::Error> {
        sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (name, description)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(description)
        .fetch_one(&self.db)
        .await
    }

    // ==================== Permissions ====================

    /// 列出所有权限
    pub async fn list_permissions(&self) -> Result<Vec<Permission>, AppError> {
        let permissions = sqlx::query_as::<_, Permission>("SELECT * FROM permissions ORDER BY id")
            .fetch_all(&self.db)
            .await?;

        Ok(permissions)
    }

    /// 返回给定 ID 中实际存在的权限 ID
    pub async fn existing_permission_ids(&self, ids: &[i64]) -> Result<Vec<i64>, AppError> {
        let found: Vec<i64> =
            sqlx::query_scalar("SELECT id FROM permissions WHERE id = ANY($1) ORDER BY id")
                .bind(ids)
                .fetch_all(&self.db)
                .await?;

        Ok(found)
    }

    /// 角色已拥有的权限 ID
    pub async fn assigned_permission_ids(&self, role_id: i64) -> Result<Vec<i64>, AppError> {
        let ids: Vec<i64> = sqlx::query_scalar(
            "SELECT permission_id FROM role_permissions WHERE role_id = $1 ORDER BY permission_id",
        )
        .bind(role_id)
        .fetch_all(&self.db)
        .await?;

        Ok(ids)
    }

    /// 为角色追加权限，已存在的组合跳过
    pub async fn assign_permissions(
        &self,
        role_id: i64,
        permission_ids: &[i64],
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO role_permissions (role_id, permission_id)
            SELECT $1, UNNEST($2::BIGINT[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(role_id)
        .bind(permission_ids)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected())
    }

    /// 一组角色的权限，按角色 ID 分组
    pub async fn permissions_for_roles(
        &self,
        role_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<Permission>>, AppError> {
        let rows = sqlx::query_as::<_, RolePermissionRow>(
            r#"
            SELECT rp.role_id, p.id, p.name, p.description, p.created_at, p.updated_at
            FROM role_permissions rp
            JOIN permissions p ON p.id = rp.permission_id
            WHERE rp.role_id = ANY($1)
            ORDER BY p.id
            "#,
        )
        .bind(role_ids)
        .fetch_all(&self.db)
        .await?;

        let mut grouped: HashMap<i64, Vec<Permission>> = HashMap::new();
        for row in rows {
            grouped.entry(row.role_id).or_default().push(row.into());
        }

        Ok(grouped)
    }

    /// 角色的权限名称（写入访问令牌）
    pub async fn permission_names(&self, role_id: i64) -> Result<Vec<String>, AppError> {
        let names: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT p.name
            FROM role_permissions rp
            JOIN permissions p ON p.id = rp.permission_id
            WHERE rp.role_id = $1
            ORDER BY p.id
            "#,
        )
        .bind(role_id)
        .fetch_all(&self.db)
        .await?;

        Ok(names)
    }
}

//! User repository (数据库访问层)

use crate::{
    error::AppError,
    models::user::{User, UserResponse},
};
use sqlx::PgPool;

const USER_RESPONSE_COLUMNS: &str = r#"
    u.id, u.name, u.email, u.role_id, r.name AS role, u.created_at, u.updated_at
"#;

pub struct UserRepository {
    db: PgPool,
}

impl UserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 根据邮箱查找用户
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.db)
            .await?;

        Ok(user)
    }

    /// 根据 ID 查找用户（含角色名）
    pub async fn find_response_by_id(&self, id: i64) -> Result<Option<UserResponse>, AppError> {
        let user = sqlx::query_as::<_, UserResponse>(&format!(
            "SELECT {} FROM users u LEFT JOIN roles r ON r.id = u.role_id WHERE u.id = $1",
            USER_RESPONSE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    /// 创建用户（不分配角色）
    pub async fn create(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.db)
        .await
    }

    /// 设置用户角色
    pub async fn set_role(&self, user_id: i64, role_id: Option<i64>) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE users SET role_id = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(role_id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// 分页列出用户
    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<UserResponse>, AppError> {
        let users = sqlx::query_as::<_, UserResponse>(&format!(
            r#"
            SELECT {}
            FROM users u
            LEFT JOIN roles r ON r.id = u.role_id
            ORDER BY u.id
            LIMIT $1 OFFSET $2
            "#,
            USER_RESPONSE_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        Ok(users)
    }

    /// 用户总数
    pub async fn count(&self) -> Result<i64, AppError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.db)
            .await?;

        Ok(total)
    }
}

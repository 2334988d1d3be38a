//! 认证服务：注册、登录、启动时的管理员引导

use crate::{
    auth::{jwt::TokenSubject, password::PasswordHasher, JwtService, SUPER_ADMIN_ROLE},
    config::{AppConfig, BootstrapConfig},
    error::{map_unique_violation, AppError},
    models::{auth::*, user::*},
    repository::{role_repo::RoleRepository, user_repo::UserRepository},
    response::FieldError,
};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use std::sync::Arc;

const INVALID_CREDENTIALS: &str = "Invalid credentials!";
const EMAIL_IN_USE: &str = "This email is already in use";

pub struct AuthService {
    db: PgPool,
    jwt_service: Arc<JwtService>,
    config: Arc<AppConfig>,
    hasher: PasswordHasher,
}

impl AuthService {
    pub fn new(db: PgPool, jwt_service: Arc<JwtService>, config: Arc<AppConfig>) -> Self {
        Self {
            db,
            jwt_service,
            config,
            hasher: PasswordHasher::new(),
        }
    }

    /// 注册新用户，不分配角色
    pub async fn register(&self, req: RegisterRequest) -> Result<User, AppError> {
        let min_length = self.config.security.password_min_length;
        if req.password.chars().count() < min_length {
            return Err(AppError::field(
                "password",
                format!("Password must be at least {} characters long", min_length),
            ));
        }

        let user_repo = UserRepository::new(self.db.clone());

        if user_repo.find_by_email(&req.email).await?.is_some() {
            return Err(AppError::invalid(
                "Invalid input",
                vec![FieldError::new("email", EMAIL_IN_USE)],
            ));
        }

        let password_hash = self.hasher.hash(&req.password)?;

        let user = user_repo
            .create(req.name.trim(), &req.email, &password_hash)
            .await
            .map_err(|e| map_unique_violation(e, EMAIL_IN_USE))?;

        tracing::info!(user_id = user.id, "User registered");

        Ok(user)
    }

    /// 用户登录
    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse, AppError> {
        let user_repo = UserRepository::new(self.db.clone());

        let Some(user) = user_repo.find_by_email(&req.email).await? else {
            metrics::counter!("auth_login_total", "outcome" => "unknown_email").increment(1);
            return Err(AppError::BadRequest(INVALID_CREDENTIALS.to_string()));
        };

        if !self.hasher.verify(&req.password, &user.password_hash)? {
            metrics::counter!("auth_login_total", "outcome" => "wrong_password").increment(1);
            tracing::debug!(user_id = user.id, "Login failed: wrong password");
            return Err(AppError::BadRequest(INVALID_CREDENTIALS.to_string()));
        }

        // 角色名与权限名写入令牌，守卫据此判断
        let (role, permissions) = self.role_and_permissions(user.role_id).await?;

        let token = self.jwt_service.generate_access_token(TokenSubject {
            user_id: user.id,
            email: &user.email,
            name: &user.name,
            role: role.as_deref(),
            permissions,
        })?;

        metrics::counter!("auth_login_total", "outcome" => "success").increment(1);
        tracing::info!(user_id = user.id, role = ?role, "User logged in");

        Ok(LoginResponse {
            token,
            expires_in: self.jwt_service.expires_in(),
            user: UserResponse::from_user(user, role),
        })
    }

    async fn role_and_permissions(
        &self,
        role_id: Option<i64>,
    ) -> Result<(Option<String>, Vec<String>), AppError> {
        let Some(role_id) = role_id else {
            return Ok((None, Vec::new()));
        };

        let role_repo = RoleRepository::new(self.db.clone());
        match role_repo.find_by_id(role_id).await? {
            Some(role) => {
                let permissions = role_repo.permission_names(role.id).await?;
                Ok((Some(role.name), permissions))
            }
            None => Ok((None, Vec::new())),
        }
    }

    /// 按配置创建（或提升）管理员账号，赋予 Super-admin 角色
    pub async fn ensure_bootstrap_admin(&self, bootstrap: &BootstrapConfig) -> Result<(), AppError> {
        let (Some(email), Some(password)) = (&bootstrap.admin_email, &bootstrap.admin_password)
        else {
            return Ok(());
        };

        let role_repo = RoleRepository::new(self.db.clone());
        let role = role_repo
            .find_by_name(SUPER_ADMIN_ROLE)
            .await?
            .ok_or_else(|| AppError::Config(format!("Role '{}' is not seeded", SUPER_ADMIN_ROLE)))?;

        let user_repo = UserRepository::new(self.db.clone());
        let user = match user_repo.find_by_email(email).await? {
            Some(user) => user,
            None => {
                let name = bootstrap.admin_name.as_deref().unwrap_or("Administrator");
                let password_hash = self.hasher.hash(password.expose_secret())?;
                let user = user_repo.create(name, email, &password_hash).await?;
                tracing::info!(user_id = user.id, "Bootstrap admin created");
                user
            }
        };

        if user.role_id != Some(role.id) {
            user_repo.set_role(user.id, Some(role.id)).await?;
            tracing::info!(user_id = user.id, role = %role.name, "Bootstrap admin role assigned");
        }

        Ok(())
    }
}

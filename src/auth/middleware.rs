//! JWT 认证中间件与访问守卫

use crate::{auth::jwt::JwtService, error::AppError};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// 认证上下文（附加到请求扩展）
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: i64,
    pub email: String,
    pub name: String,
    pub role: Option<String>,
    pub permissions: Vec<String>,
}

impl AuthContext {
    /// 角色守卫：令牌不带角色为 401，角色不符为 403
    pub fn require_role(&self, required: &str) -> Result<(), AppError> {
        match self.role.as_deref() {
            None => Err(AppError::unauthorized()),
            Some(role) if role == required => Ok(()),
            Some(role) => {
                tracing::debug!(
                    user_id = self.user_id,
                    role = %role,
                    required = %required,
                    "Role check failed"
                );
                Err(AppError::forbidden())
            }
        }
    }

    /// 权限守卫：令牌中的权限名必须包含所需权限
    pub fn require_permission(&self, required: &str) -> Result<(), AppError> {
        if self.permissions.iter().any(|p| p == required) {
            Ok(())
        } else {
            tracing::debug!(
                user_id = self.user_id,
                required = %required,
                "Permission check failed"
            );
            Err(AppError::forbidden())
        }
    }
}

// 在 handler 中直接提取 AuthContext
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or_else(AppError::unauthorized)
    }
}

/// 从 Authorization 头提取 Bearer 令牌
pub fn extract_token(headers: &HeaderMap) -> Result<String, AppError> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .ok_or_else(AppError::unauthorized)
}

/// JWT 认证中间件 - 必须认证
pub async fn jwt_auth_middleware(
    State(jwt_service): State<Arc<JwtService>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(req.headers())?;

    let claims = jwt_service.validate_access_token(&token)?;

    let user_id = claims
        .sub
        .parse::<i64>()
        .map_err(|_| AppError::unauthorized())?;
    let auth_context = AuthContext {
        user_id,
        email: claims.email,
        name: claims.name,
        role: claims.role,
        permissions: claims.permissions,
    };

    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(role: Option<&str>, permissions: &[&str]) -> AuthContext {
        AuthContext {
            user_id: 1,
            email: "admin@example.com".to_string(),
            name: "Admin".to_string(),
            role: role.map(str::to_string),
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn test_extract_token_valid() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Bearer test_token_123".parse().unwrap());

        let token = extract_token(&headers).unwrap();
        assert_eq!(token, "test_token_123");
    }

    #[test]
    fn test_extract_token_missing() {
        let headers = HeaderMap::new();
        assert!(extract_token(&headers).is_err());
    }

    #[test]
    fn test_extract_token_invalid_format() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "InvalidFormat".parse().unwrap());
        assert!(extract_token(&headers).is_err());

        headers.insert("authorization", "Bearer ".parse().unwrap());
        assert!(extract_token(&headers).is_err());
    }

    #[test]
    fn test_require_role() {
        assert!(context(Some("Super-admin"), &[]).require_role("Super-admin").is_ok());
        assert_eq!(
            context(Some("Customer"), &[]).require_role("Super-admin").unwrap_err().code(),
            403
        );
        assert_eq!(context(None, &[]).require_role("Super-admin").unwrap_err().code(), 401);
    }

    #[test]
    fn test_require_permission() {
        let ctx = context(Some("Customer"), &["read"]);
        assert!(ctx.require_permission("read").is_ok());
        assert_eq!(ctx.require_permission("create").unwrap_err().code(), 403);
    }
}

//! 访问守卫提取器
//!
//! 守卫在请求体解析之前执行：无权限的请求直接得到 401/403，而不是校验错误。

use super::{middleware::AuthContext, SUPER_ADMIN_ROLE};
use crate::error::AppError;
use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;

/// 要求 Super-admin 角色
#[derive(Debug, Clone)]
pub struct SuperAdmin(pub AuthContext);

impl<S> FromRequestParts<S> for SuperAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let context = AuthContext::from_request_parts(parts, state).await?;
        context.require_role(SUPER_ADMIN_ROLE)?;
        Ok(Self(context))
    }
}

/// 权限名
pub trait PermissionName {
    const NAME: &'static str;
}

#[derive(Debug, Clone, Copy)]
pub struct CreatePermission;
#[derive(Debug, Clone, Copy)]
pub struct UpdatePermission;
#[derive(Debug, Clone, Copy)]
pub struct DeletePermission;

impl PermissionName for CreatePermission {
    const NAME: &'static str = "create";
}

impl PermissionName for UpdatePermission {
    const NAME: &'static str = "update";
}

impl PermissionName for DeletePermission {
    const NAME: &'static str = "delete";
}

/// 要求令牌中带有权限 `P`
#[derive(Debug, Clone)]
pub struct Permitted<P> {
    pub context: AuthContext,
    _permission: PhantomData<fn() -> P>,
}

impl<P, S> FromRequestParts<S> for Permitted<P>
where
    P: PermissionName,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let context = AuthContext::from_request_parts(parts, state).await?;
        context.require_permission(P::NAME)?;
        Ok(Self {
            context,
            _permission: PhantomData,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(context: Option<AuthContext>) -> Parts {
        let mut req = Request::builder().uri("/").body(()).unwrap();
        if let Some(context) = context {
            req.extensions_mut().insert(context);
        }
        req.into_parts().0
    }

    fn context(role: &str, permissions: &[&str]) -> AuthContext {
        AuthContext {
            user_id: 3,
            email: "u@example.com".to_string(),
            name: "User".to_string(),
            role: Some(role.to_string()),
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_super_admin_guard() {
        let mut parts = parts_with(Some(context(SUPER_ADMIN_ROLE, &[])));
        assert!(SuperAdmin::from_request_parts(&mut parts, &()).await.is_ok());

        let mut parts = parts_with(Some(context("Customer", &["read"])));
        let err = SuperAdmin::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert_eq!(err.code(), 403);

        let mut parts = parts_with(None);
        let err = SuperAdmin::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert_eq!(err.code(), 401);
    }

    #[tokio::test]
    async fn test_permission_guard() {
        let mut parts = parts_with(Some(context("Customer", &["read", "create"])));
        let permitted = Permitted::<CreatePermission>::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(permitted.context.user_id, 3);

        let err = Permitted::<DeletePermission>::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(err.code(), 403);
    }
}

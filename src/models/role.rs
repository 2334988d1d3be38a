//! Role and permission domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Role
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: i64,
    pub name: String,
    #[serde(rename = "desc")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Permission
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    pub id: i64,
    pub name: String,
    #[serde(rename = "desc")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Permission granted to a role (joined row)
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RolePermissionRow {
    pub role_id: i64,
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RolePermissionRow> for Permission {
    fn from(row: RolePermissionRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Role with its permissions
#[derive(Debug, Clone, Serialize)]
pub struct RoleWithPermissions {
    #[serde(flatten)]
    pub role: Role,
    pub permissions: Vec<Permission>,
}

/// Paginated role listing
#[derive(Debug, Serialize)]
pub struct RoleList {
    pub roles: Vec<RoleWithPermissions>,
    pub pagination: crate::pagination::Pagination,
}

/// Create role request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRoleRequest {
    #[serde(default)]
    #[validate(length(min = 3, message = "Role name must be at least 3 characters long"))]
    pub name: String,

    #[validate(length(min = 3, message = "Role description must be at least 3 characters long"))]
    pub desc: Option<String>,
}

/// Assign permissions request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssignPermissionsRequest {
    pub role_id: i64,

    #[serde(default)]
    #[validate(length(min = 1, message = "At least one permission ID is required"))]
    pub permission_ids: Vec<i64>,
}

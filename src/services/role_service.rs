//! 角色与权限服务

use crate::{
    error::{map_unique_violation, AppError},
    models::role::*,
    repository::role_repo::RoleRepository,
};
use sqlx::PgPool;

const ROLE_NAME_IN_USE: &str = "This role name is already in use";

/// 权限分配结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOutcome {
    Assigned(u64),
    AlreadyAssigned,
}

pub struct RoleService {
    db: PgPool,
}

impl RoleService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    fn repo(&self) -> RoleRepository {
        RoleRepository::new(self.db.clone())
    }

    pub async fn create(&self, req: CreateRoleRequest) -> Result<Role, AppError> {
        let repo = self.repo();
        let name = req.name.trim();

        if repo.find_by_name(name).await?.is_some() {
            return Err(AppError::field("name", ROLE_NAME_IN_USE));
        }

        let role = repo
            .create(name, req.desc.as_deref())
            .await
            .map_err(|e| map_unique_violation(e, ROLE_NAME_IN_USE))?;

        tracing::info!(role_id = role.id, name = %role.name, "Role created");
        Ok(role)
    }

    /// 为角色追加权限：先校验角色与权限 ID，再只插入缺失的组合
    pub async fn assign_permissions(
        &self,
        req: AssignPermissionsRequest,
    ) -> Result<AssignOutcome, AppError> {
        let repo = self.repo();

        if repo.find_by_id(req.role_id).await?.is_none() {
            return Err(AppError::field("roleId", "This role not found"));
        }

        let mut requested = req.permission_ids;
        requested.sort_unstable();
        requested.dedup();

        let existing = repo.existing_permission_ids(&requested).await?;
        let invalid = missing_ids(&requested, &existing);
        if !invalid.is_empty() {
            return Err(AppError::field(
                "permissionIds",
                format!("Invalid permission IDs: {}", join_ids(&invalid)),
            ));
        }

        let assigned = repo.assigned_permission_ids(req.role_id).await?;
        let to_insert = missing_ids(&requested, &assigned);
        if to_insert.is_empty() {
            return Ok(AssignOutcome::AlreadyAssigned);
        }

        let inserted = repo.assign_permissions(req.role_id, &to_insert).await?;
        tracing::info!(role_id = req.role_id, inserted, "Permissions assigned");

        Ok(AssignOutcome::Assigned(inserted))
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<(Vec<RoleWithPermissions>, i64), AppError> {
        let repo = self.repo();
        let total = repo.count().await?;
        let roles = repo.list(limit, offset).await?;

        let ids: Vec<i64> = roles.iter().map(|r| r.id).collect();
        let mut permissions = repo.permissions_for_roles(&ids).await?;

        let roles = roles
            .into_iter()
            .map(|role| RoleWithPermissions {
                permissions: permissions.remove(&role.id).unwrap_or_default(),
                role,
            })
            .collect();

        Ok((roles, total))
    }

    pub async fn get(&self, id: i64) -> Result<RoleWithPermissions, AppError> {
        let repo = self.repo();
        let role = repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Role not found"))?;

        let permissions = repo
            .permissions_for_roles(&[role.id])
            .await?
            .remove(&role.id)
            .unwrap_or_default();

        Ok(RoleWithPermissions { role, permissions })
    }

    pub async fn list_permissions(&self) -> Result<Vec<Permission>, AppError> {
        self.repo().list_permissions().await
    }
}

/// `requested` 中不在 `present` 里的 ID（保持顺序）
fn missing_ids(requested: &[i64], present: &[i64]) -> Vec<i64> {
    requested
        .iter()
        .copied()
        .filter(|id| !present.contains(id))
        .collect()
}

fn join_ids(ids: &[i64]) -> String {
    ids.iter().map(i64::to_string).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_ids() {
        assert_eq!(missing_ids(&[1, 2, 7, 9], &[1, 2]), vec![7, 9]);
        assert!(missing_ids(&[1, 2], &[1, 2, 3]).is_empty());
    }

    #[test]
    fn test_join_ids_message_format() {
        assert_eq!(
            format!("Invalid permission IDs: {}", join_ids(&[7, 9])),
            "Invalid permission IDs: 7, 9"
        );
    }
}

//! Authentication and authorization module

pub mod guard;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use guard::{CreatePermission, DeletePermission, Permitted, SuperAdmin, UpdatePermission};
pub use jwt::{Claims, JwtService, TokenSubject};
pub use middleware::{extract_token, jwt_auth_middleware, AuthContext};
pub use password::PasswordHasher;

/// Role required by the role-management endpoints
pub const SUPER_ADMIN_ROLE: &str = "Super-admin";

//! Business logic services layer

pub mod auth_service;
pub mod cart_service;
pub mod category_service;
pub mod product_service;
pub mod role_service;
pub mod storage_service;

pub use auth_service::AuthService;
pub use cart_service::CartService;
pub use category_service::CategoryService;
pub use product_service::ProductService;
pub use role_service::RoleService;
pub use storage_service::StorageService;

//! Database repository layer

pub mod cart_repo;
pub mod category_repo;
pub mod product_repo;
pub mod role_repo;
pub mod user_repo;

pub use cart_repo::*;
pub use category_repo::*;
pub use product_repo::*;
pub use role_repo::*;
pub use user_repo::*;

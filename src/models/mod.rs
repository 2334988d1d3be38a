//! 数据模型模块
//! 数据库行、请求体与响应体

pub mod auth;
pub mod cart;
pub mod category;
pub mod product;
pub mod role;
pub mod user;

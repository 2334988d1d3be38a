//! 电商后端服务库
//! 认证、角色权限、分类、商品与购物车

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod multipart;
pub mod pagination;
pub mod repository;
pub mod response;
pub mod routes;
pub mod services;
pub mod telemetry;
pub mod validation;

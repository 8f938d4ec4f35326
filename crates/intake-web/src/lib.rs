//! # 分诊Web模块
//!
//! 分诊服务的HTTP边界：服务对象、处理器与路由。

pub mod handlers;
pub mod server;
pub mod service;

pub use handlers::ApiError;
pub use server::{create_app, WebServer};
pub use service::IntakeService;

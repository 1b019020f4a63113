//! HTTP 请求处理器模块

pub mod attribute;
pub mod category;
pub mod content;
pub mod health;
pub mod model;

//! 共享库
//!
//! 包含内容服务共用的配置加载、基础设施错误、数据库连接和可观测性代码。

pub mod config;
pub mod database;
pub mod error;
pub mod observability;

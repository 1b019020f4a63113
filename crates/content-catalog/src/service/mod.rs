//! 服务层
//!
//! 在聚合外层加上并发控制与持久化：变更串行执行，
//! 先在副本上应用并写入仓储，成功后才替换内存状态。
//!
//! ## 模块结构
//!
//! - `catalog_service`: 目录服务（读写入口）

pub mod catalog_service;

pub use catalog_service::CatalogService;

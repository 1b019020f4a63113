//! 内容目录
//!
//! 动态属性内容目录的领域核心。
//!
//! ## 核心功能
//!
//! - **属性表**：可复用的单选 / 多选属性及其有序属性值
//! - **内容模型**：从属性表中挑选属性和属性值组成的可复用方案
//! - **分类树**：层级分类，节点可绑定内容模型，支持移动与同级排序
//! - **属性值绑定**：内容项按所在分类的模型选择属性值，并随模型、分类变化保持一致
//!
//! ## 模块结构
//!
//! - `models`: 领域模型定义
//! - `error`: 错误类型定义
//! - `selection`: 模型属性选择状态机
//! - `tree`: 分类树算法
//! - `catalog`: 目录聚合（同步、纯内存）
//! - `repository`: 仓储层（PostgreSQL / 内存）
//! - `service`: 服务层（并发控制与持久化）

pub mod catalog;
pub mod error;
pub mod models;
pub mod repository;
pub mod selection;
pub mod service;
pub mod tree;

pub use catalog::{Catalog, CatalogChange, CatalogSnapshot, dto};
pub use error::{CatalogError, Result};
pub use models::*;
pub use repository::{CatalogRepositoryTrait, MemoryCatalogRepository, PgCatalogRepository};
pub use selection::ModelSelection;
pub use service::CatalogService;

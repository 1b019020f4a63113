//! 仓储层
//!
//! 目录以快照加载、以变更集写入。
//!
//! ## 设计原则
//!
//! - 仓储只负责数据持久化，不包含业务逻辑
//! - 一个变更集对应一个事务，失败不留部分写入
//! - 定义 trait 接口以支持 mock 测试和存储后端切换

mod memory_repo;
mod pg_repo;
mod traits;

pub use memory_repo::MemoryCatalogRepository;
pub use pg_repo::PgCatalogRepository;
pub use traits::*;

//! 仓储 Trait 定义
//!
//! 定义仓储接口，便于服务层依赖抽象而非具体实现，支持 mock 测试

use async_trait::async_trait;

use crate::catalog::{CatalogChange, CatalogSnapshot};
use crate::error::Result;

/// 内容目录仓储接口
///
/// 聚合以快照形式整体加载，变更以变更集为单位原子写入
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogRepositoryTrait: Send + Sync {
    /// 加载完整目录快照（服务启动时调用）
    async fn load_snapshot(&self) -> Result<CatalogSnapshot>;

    /// 在一个事务内写入变更集，失败时不得留下部分写入
    async fn apply_changes(&self, changes: &[CatalogChange]) -> Result<()>;

    /// 存储可用性检查（就绪探针使用）
    async fn health_check(&self) -> Result<()>;
}

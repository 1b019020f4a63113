//! 应用状态定义

use std::sync::Arc;

use content_catalog::{CatalogRepositoryTrait, CatalogService};

/// 动态分发的目录服务，存储后端在启动时按配置选择
pub type SharedCatalog = Arc<CatalogService<dyn CatalogRepositoryTrait>>;

/// Axum 应用共享状态
#[derive(Clone)]
pub struct AppState {
    pub catalog: SharedCatalog,
    /// 服务名，出现在健康检查响应中
    pub service_name: Arc<str>,
}

impl AppState {
    pub fn new(catalog: SharedCatalog, service_name: &str) -> Self {
        Self {
            catalog,
            service_name: Arc::from(service_name),
        }
    }

    /// 从仓储加载目录并创建状态
    pub async fn load(
        repo: Arc<dyn CatalogRepositoryTrait>,
        service_name: &str,
    ) -> content_catalog::Result<Self> {
        let catalog = CatalogService::load(repo).await?;
        Ok(Self::new(Arc::new(catalog), service_name))
    }
}

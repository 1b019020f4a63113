//! 目录服务
//!
//! 聚合放在 `tokio::sync::RwLock` 中。写操作流程：
//!
//! 1. 获取写锁并克隆聚合
//! 2. 在副本上执行操作，记录变更集
//! 3. 通过仓储在一个事务内写入变更集
//! 4. 写入成功后用副本替换当前状态
//!
//! 校验失败或写入失败时内存状态保持不变。并发编辑按到达顺序串行，后写覆盖先写。

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::RwLock;
use tracing::{error, info, instrument, warn};

use content_shared::observability::metrics::record_catalog_mutation;

use crate::catalog::dto::{
    AttributePatch, CategoryPatch, ContentFilter, ContentPatch, ModelPatch, NewAttribute,
    NewCategory, NewContent, NewModel, Page, PageRequest,
};
use crate::catalog::{Catalog, CatalogSnapshot};
use crate::error::Result;
use crate::models::{
    Attribute, AttributeSelection, Category, CategoryNode, ContentItem, ContentModel,
    ModelAttributeValueRef, ModelDetail, SelectionSet,
};
use crate::repository::CatalogRepositoryTrait;

/// 内容目录服务
pub struct CatalogService<R>
where
    R: CatalogRepositoryTrait + ?Sized,
{
    repo: Arc<R>,
    catalog: RwLock<Catalog>,
}

impl<R> CatalogService<R>
where
    R: CatalogRepositoryTrait + ?Sized,
{
    /// 从仓储加载快照并创建服务
    #[instrument(skip(repo))]
    pub async fn load(repo: Arc<R>) -> Result<Self> {
        let snapshot = repo.load_snapshot().await?;
        let catalog = Catalog::from_snapshot(snapshot);

        info!(
            attributes = catalog.attribute_count(),
            models = catalog.model_count(),
            categories = catalog.category_count(),
            contents = catalog.content_count(),
            "Content catalog loaded"
        );

        Ok(Self {
            repo,
            catalog: RwLock::new(catalog),
        })
    }

    /// 存储健康检查
    pub async fn health_check(&self) -> Result<()> {
        self.repo.health_check().await
    }

    /// 当前内存状态的快照
    pub async fn snapshot(&self) -> CatalogSnapshot {
        self.read(Catalog::snapshot).await
    }

    async fn read<T>(&self, query: impl FnOnce(&Catalog) -> T) -> T {
        let catalog = self.catalog.read().await;
        query(&catalog)
    }

    /// 串行执行一次变更：副本上应用 → 持久化 → 替换
    async fn mutate<T, F>(&self, operation: &'static str, apply: F) -> Result<T>
    where
        F: FnOnce(&mut Catalog) -> Result<T> + Send,
        T: Send,
    {
        let start = Instant::now();
        let mut current = self.catalog.write().await;
        let mut draft = current.clone();

        let value = match apply(&mut draft) {
            Ok(value) => value,
            Err(e) => {
                warn!(operation, error = %e, "Catalog mutation rejected");
                record_catalog_mutation(operation, "rejected", start.elapsed().as_secs_f64());
                return Err(e);
            }
        };

        let changes = draft.take_changes();
        if !changes.is_empty() {
            if let Err(e) = self.repo.apply_changes(&changes).await {
                error!(
                    operation,
                    changes = changes.len(),
                    error = %e,
                    "Failed to persist catalog changes"
                );
                record_catalog_mutation(operation, "failed", start.elapsed().as_secs_f64());
                return Err(e);
            }
        }

        *current = draft;
        record_catalog_mutation(operation, "ok", start.elapsed().as_secs_f64());
        Ok(value)
    }

    // ==================== 属性 ====================

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_attribute(&self, input: NewAttribute) -> Result<Attribute> {
        let attribute = self
            .mutate("attribute.create", |c| c.create_attribute(input))
            .await?;
        info!(attribute_id = attribute.id, "Attribute created");
        Ok(attribute)
    }

    #[instrument(skip(self, patch))]
    pub async fn update_attribute(&self, id: i64, patch: AttributePatch) -> Result<Attribute> {
        let attribute = self
            .mutate("attribute.update", |c| c.update_attribute(id, patch))
            .await?;
        info!(attribute_id = id, "Attribute updated");
        Ok(attribute)
    }

    #[instrument(skip(self))]
    pub async fn delete_attribute(&self, id: i64) -> Result<()> {
        self.mutate("attribute.delete", |c| c.delete_attribute(id))
            .await?;
        info!(attribute_id = id, "Attribute deleted");
        Ok(())
    }

    #[instrument(skip(self, ordered))]
    pub async fn reorder_attribute_values(&self, id: i64, ordered: Vec<i64>) -> Result<Attribute> {
        self.mutate("attribute.reorder_values", |c| {
            c.reorder_attribute_values(id, &ordered)
        })
        .await
    }

    pub async fn get_attribute(&self, id: i64) -> Result<Attribute> {
        self.read(|c| c.get_attribute(id)).await
    }

    pub async fn list_attributes(&self) -> Vec<Attribute> {
        self.read(Catalog::list_attributes).await
    }

    pub async fn search_attributes(&self, query: &str) -> Vec<Attribute> {
        self.read(|c| c.search_attributes(query)).await
    }

    // ==================== 内容模型 ====================

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_model(&self, input: NewModel) -> Result<ContentModel> {
        let model = self
            .mutate("model.create", |c| c.create_model(input))
            .await?;
        info!(model_id = model.id, bindings = model.bindings.len(), "Content model created");
        Ok(model)
    }

    #[instrument(skip(self, patch))]
    pub async fn update_model(&self, id: i64, patch: ModelPatch) -> Result<ContentModel> {
        let model = self
            .mutate("model.update", |c| c.update_model(id, patch))
            .await?;
        info!(model_id = id, "Content model updated");
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn delete_model(&self, id: i64) -> Result<()> {
        self.mutate("model.delete", |c| c.delete_model(id)).await?;
        info!(model_id = id, "Content model deleted");
        Ok(())
    }

    pub async fn get_model(&self, id: i64) -> Result<ModelDetail> {
        self.read(|c| c.get_model(id)).await
    }

    pub async fn list_models(&self) -> Vec<ModelDetail> {
        self.read(Catalog::list_models).await
    }

    pub async fn get_model_attributes(&self, id: i64) -> Result<Vec<i64>> {
        self.read(|c| c.get_model_attributes(id)).await
    }

    pub async fn get_model_attribute_values(&self, id: i64) -> Result<Vec<ModelAttributeValueRef>> {
        self.read(|c| c.get_model_attribute_values(id)).await
    }

    // ==================== 分类 ====================

    #[instrument(skip(self, input), fields(name = %input.name, parent_id = ?input.parent_id))]
    pub async fn create_category(&self, input: NewCategory) -> Result<Category> {
        let category = self
            .mutate("category.create", |c| c.create_category(input))
            .await?;
        info!(category_id = category.id, "Category created");
        Ok(category)
    }

    #[instrument(skip(self, patch))]
    pub async fn update_category(&self, id: i64, patch: CategoryPatch) -> Result<Category> {
        let category = self
            .mutate("category.update", |c| c.update_category(id, patch))
            .await?;
        info!(category_id = id, "Category updated");
        Ok(category)
    }

    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: i64) -> Result<()> {
        self.mutate("category.delete", |c| c.delete_category(id))
            .await?;
        info!(category_id = id, "Category deleted");
        Ok(())
    }

    /// 级联删除子树，返回删除的分类数
    #[instrument(skip(self))]
    pub async fn remove_category(&self, id: i64) -> Result<usize> {
        let removed = self
            .mutate("category.remove", |c| c.remove_category(id))
            .await?;
        info!(category_id = id, removed, "Category subtree removed");
        Ok(removed)
    }

    #[instrument(skip(self))]
    pub async fn move_category(&self, id: i64, new_parent_id: Option<i64>) -> Result<Category> {
        let category = self
            .mutate("category.move", |c| c.move_category(id, new_parent_id))
            .await?;
        info!(category_id = id, parent_id = ?new_parent_id, sort = category.sort, "Category moved");
        Ok(category)
    }

    #[instrument(skip(self))]
    pub async fn update_sort(&self, id: i64, sort: i32) -> Result<Vec<Category>> {
        self.mutate("category.update_sort", |c| c.update_sort(id, sort))
            .await
    }

    pub async fn get_category(&self, id: i64) -> Result<Category> {
        self.read(|c| c.get_category(id)).await
    }

    pub async fn get_tree(&self) -> Vec<CategoryNode> {
        self.read(Catalog::get_tree).await
    }

    pub async fn get_active_tree(&self) -> Vec<CategoryNode> {
        self.read(Catalog::get_active_tree).await
    }

    pub async fn filter_tree(&self, query: &str) -> Vec<CategoryNode> {
        self.read(|c| c.filter_tree(query)).await
    }

    // ==================== 内容与属性值绑定 ====================

    pub async fn resolve_applicable(&self, category_id: i64) -> Result<Option<ModelDetail>> {
        self.read(|c| c.resolve_applicable(category_id)).await
    }

    #[instrument(skip(self))]
    pub async fn set_selection(
        &self,
        item_id: i64,
        attribute_id: i64,
        value_id: i64,
    ) -> Result<SelectionSet> {
        self.mutate("content.set_selection", |c| {
            c.set_selection(item_id, attribute_id, value_id)
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn clear_attribute(&self, item_id: i64, attribute_id: i64) -> Result<SelectionSet> {
        self.mutate("content.clear_attribute", |c| {
            c.clear_attribute(item_id, attribute_id)
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn recategorize(&self, item_id: i64, category_id: Option<i64>) -> Result<ContentItem> {
        let item = self
            .mutate("content.recategorize", |c| c.recategorize(item_id, category_id))
            .await?;
        info!(content_id = item_id, category_id = ?category_id, selections = item.selections.len(), "Content recategorized");
        Ok(item)
    }

    pub async fn selections(&self, item_id: i64) -> Result<Vec<AttributeSelection>> {
        self.read(|c| c.selections(item_id)).await
    }

    #[instrument(skip(self, input), fields(category_id = ?input.category_id))]
    pub async fn create_content(&self, input: NewContent) -> Result<ContentItem> {
        let item = self
            .mutate("content.create", |c| c.create_content(input))
            .await?;
        info!(content_id = item.id, "Content created");
        Ok(item)
    }

    #[instrument(skip(self, patch))]
    pub async fn update_content(&self, id: i64, patch: ContentPatch) -> Result<ContentItem> {
        let item = self
            .mutate("content.update", |c| c.update_content(id, patch))
            .await?;
        info!(content_id = id, "Content updated");
        Ok(item)
    }

    #[instrument(skip(self))]
    pub async fn delete_content(&self, id: i64) -> Result<()> {
        self.mutate("content.delete", |c| c.delete_content(id))
            .await?;
        info!(content_id = id, "Content deleted");
        Ok(())
    }

    pub async fn get_content(&self, id: i64) -> Result<ContentItem> {
        self.read(|c| c.get_content(id)).await
    }

    pub async fn list_contents(&self, filter: ContentFilter, page: PageRequest) -> Page<ContentItem> {
        self.read(|c| c.list_contents(&filter, page)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogChange;
    use crate::catalog::dto::NewCategory;
    use crate::error::CatalogError;
    use crate::repository::MockCatalogRepositoryTrait;

    fn root(name: &str, sort: i32) -> NewCategory {
        NewCategory {
            name: name.to_string(),
            sort,
            is_active: true,
            ..Default::default()
        }
    }

    async fn service_with(mock: MockCatalogRepositoryTrait) -> CatalogService<MockCatalogRepositoryTrait> {
        CatalogService::load(Arc::new(mock)).await.unwrap()
    }

    fn empty_mock() -> MockCatalogRepositoryTrait {
        let mut mock = MockCatalogRepositoryTrait::new();
        mock.expect_load_snapshot()
            .returning(|| Ok(CatalogSnapshot::default()));
        mock
    }

    #[tokio::test]
    async fn test_mutation_persists_change_set() {
        let mut mock = empty_mock();
        mock.expect_apply_changes()
            .withf(|changes: &[CatalogChange]| {
                matches!(changes, [CatalogChange::UpsertCategory(c)] if c.name == "News")
            })
            .times(1)
            .returning(|_| Ok(()));
        let service = service_with(mock).await;

        let created = service.create_category(root("News", 0)).await.unwrap();

        assert_eq!(service.get_category(created.id).await.unwrap().name, "News");
    }

    /// 持久化失败时内存状态保持不变
    #[tokio::test]
    async fn test_failed_persist_leaves_state_unchanged() {
        let mut mock = empty_mock();
        let mut calls = 0;
        mock.expect_apply_changes().returning(move |_| {
            calls += 1;
            if calls == 1 {
                Ok(())
            } else {
                Err(CatalogError::Storage("connection reset".to_string()))
            }
        });
        let service = service_with(mock).await;
        let a = service.create_category(root("A", 0)).await.unwrap();
        let before = service.snapshot().await;

        let err = service.create_category(root("B", 1)).await.unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(service.snapshot().await, before);
        assert_eq!(service.get_tree().await.len(), 1);
        assert_eq!(service.get_tree().await[0].id, a.id);
    }

    #[tokio::test]
    async fn test_rejected_mutation_skips_repository() {
        let mut mock = empty_mock();
        mock.expect_apply_changes().times(0);
        let service = service_with(mock).await;

        let err = service.create_category(root("  ", 0)).await.unwrap_err();

        assert!(matches!(err, CatalogError::Validation(_)));
    }

    #[tokio::test]
    async fn test_noop_mutation_skips_repository() {
        let mut mock = MockCatalogRepositoryTrait::new();
        let seeded = {
            let mut catalog = Catalog::new();
            catalog.create_category(root("A", 0)).unwrap();
            catalog.snapshot()
        };
        mock.expect_load_snapshot()
            .returning(move || Ok(seeded.clone()));
        mock.expect_apply_changes().times(0);
        let service = service_with(mock).await;

        // 父级未变化的移动不产生变更
        let moved = service.move_category(1, None).await.unwrap();

        assert_eq!(moved.parent_id, None);
    }

    #[tokio::test]
    async fn test_load_failure_propagates() {
        let mut mock = MockCatalogRepositoryTrait::new();
        mock.expect_load_snapshot()
            .returning(|| Err(CatalogError::Storage("down".to_string())));

        let result = CatalogService::load(Arc::new(mock)).await;

        assert!(matches!(result, Err(CatalogError::Storage(_))));
    }
}

//! 内存仓储
//!
//! 开发环境与测试使用，进程退出即丢失数据

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::traits::CatalogRepositoryTrait;
use crate::catalog::{CatalogChange, CatalogSnapshot};
use crate::error::Result;
use crate::models::{Attribute, Category, ContentItem, ContentModel};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    attributes: BTreeMap<i64, Attribute>,
    models: BTreeMap<i64, ContentModel>,
    categories: BTreeMap<i64, Category>,
    contents: BTreeMap<i64, ContentItem>,
}

impl MemoryState {
    fn apply(&mut self, change: &CatalogChange) {
        match change {
            CatalogChange::UpsertAttribute(a) => {
                self.attributes.insert(a.id, a.clone());
            }
            CatalogChange::DeleteAttribute(id) => {
                self.attributes.remove(id);
            }
            CatalogChange::UpsertModel(m) => {
                self.models.insert(m.id, m.clone());
            }
            CatalogChange::DeleteModel(id) => {
                self.models.remove(id);
            }
            CatalogChange::UpsertCategory(c) => {
                self.categories.insert(c.id, c.clone());
            }
            CatalogChange::DeleteCategory(id) => {
                self.categories.remove(id);
            }
            CatalogChange::UpsertContent(c) => {
                self.contents.insert(c.id, c.clone());
            }
            CatalogChange::DeleteContent(id) => {
                self.contents.remove(id);
            }
        }
    }
}

/// 内存目录仓储
#[derive(Debug, Default)]
pub struct MemoryCatalogRepository {
    state: Mutex<MemoryState>,
}

impl MemoryCatalogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以给定快照作为初始数据
    pub fn with_snapshot(snapshot: CatalogSnapshot) -> Self {
        let state = MemoryState {
            attributes: snapshot.attributes.into_iter().map(|a| (a.id, a)).collect(),
            models: snapshot.models.into_iter().map(|m| (m.id, m)).collect(),
            categories: snapshot.categories.into_iter().map(|c| (c.id, c)).collect(),
            contents: snapshot.contents.into_iter().map(|c| (c.id, c)).collect(),
        };
        Self {
            state: Mutex::new(state),
        }
    }

    /// 当前存储内容的快照
    pub fn snapshot(&self) -> CatalogSnapshot {
        let state = self.state.lock();
        CatalogSnapshot {
            attributes: state.attributes.values().cloned().collect(),
            models: state.models.values().cloned().collect(),
            categories: state.categories.values().cloned().collect(),
            contents: state.contents.values().cloned().collect(),
        }
    }
}

#[async_trait]
impl CatalogRepositoryTrait for MemoryCatalogRepository {
    async fn load_snapshot(&self) -> Result<CatalogSnapshot> {
        Ok(self.snapshot())
    }

    async fn apply_changes(&self, changes: &[CatalogChange]) -> Result<()> {
        let mut state = self.state.lock();
        let mut next = state.clone();
        for change in changes {
            next.apply(change);
        }
        *state = next;
        Ok(())
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

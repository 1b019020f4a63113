//! 分类树操作
//!
//! 树结构每次查询时由扁平表物化；改父级前都做祖先链检查，
//! 同级排序只在同一父节点下进行，跨层级调整走 `move_category`。

use std::collections::HashSet;

use tracing::debug;

use super::dto::{CategoryPatch, NewCategory};
use super::{Catalog, EntityKey, bump, now, require_text};
use crate::error::{CatalogError, Result};
use crate::models::{Category, CategoryNode};
use crate::tree;

impl Catalog {
    pub fn create_category(&mut self, input: NewCategory) -> Result<Category> {
        let name = require_text("分类名称", &input.name)?;
        if let Some(parent_id) = input.parent_id {
            self.ensure_parent_exists(parent_id)?;
        }
        if let Some(model_id) = input.model_id {
            self.ensure_model_exists(model_id)?;
        }

        let id = bump(&mut self.ids.category);
        let timestamp = now();
        let category = Category {
            id,
            name,
            description: input.description.trim().to_string(),
            sort: input.sort,
            is_active: input.is_active,
            parent_id: input.parent_id,
            model_id: input.model_id,
            created_at: timestamp,
            updated_at: timestamp,
        };

        self.categories.insert(id, category.clone());
        self.touch(EntityKey::Category(id));
        Ok(category)
    }

    /// 更新分类
    ///
    /// 修改父级时与 `move_category` 做同样的环检查；修改模型时重新校验该分类下内容项的选择
    pub fn update_category(&mut self, id: i64, patch: CategoryPatch) -> Result<Category> {
        let mut category = self.category_ref(id)?.clone();

        if let Some(name) = &patch.name {
            category.name = require_text("分类名称", name)?;
        }
        if let Some(description) = &patch.description {
            category.description = description.trim().to_string();
        }
        if let Some(sort) = patch.sort {
            category.sort = sort;
        }
        if let Some(is_active) = patch.is_active {
            category.is_active = is_active;
        }
        if let Some(parent_id) = patch.parent_id {
            self.check_reparent(id, parent_id)?;
            category.parent_id = parent_id;
        }

        let mut model_changed = false;
        if let Some(model_id) = patch.model_id {
            if let Some(model_id) = model_id {
                self.ensure_model_exists(model_id)?;
            }
            model_changed = category.model_id != model_id;
            category.model_id = model_id;
        }

        category.updated_at = now();
        self.categories.insert(id, category.clone());
        self.touch(EntityKey::Category(id));

        if model_changed {
            let repaired = self.reconcile_contents(|item| item.category_id == Some(id));
            debug!(category_id = id, repaired, "Content selections reconciled");
        }

        Ok(category)
    }

    /// 删除单个分类，存在子分类时拒绝
    pub fn delete_category(&mut self, id: i64) -> Result<()> {
        self.category_ref(id)?;
        let children = self
            .categories
            .values()
            .filter(|c| c.parent_id == Some(id))
            .count();
        if children > 0 {
            return Err(CatalogError::CategoryHasChildren {
                category_id: id,
                children,
            });
        }

        self.categories.remove(&id);
        self.touch(EntityKey::Category(id));
        self.detach_contents(&HashSet::from([id]));
        Ok(())
    }

    /// 级联删除整棵子树，返回删除的分类数
    pub fn remove_category(&mut self, id: i64) -> Result<usize> {
        self.category_ref(id)?;
        let ids = tree::subtree_ids(&self.categories, id);

        for category_id in &ids {
            self.categories.remove(category_id);
            self.touch(EntityKey::Category(*category_id));
        }
        let removed: HashSet<i64> = ids.into_iter().collect();
        self.detach_contents(&removed);

        Ok(removed.len())
    }

    pub fn get_category(&self, id: i64) -> Result<Category> {
        self.category_ref(id).cloned()
    }

    /// 完整分类森林
    pub fn get_tree(&self) -> Vec<CategoryNode> {
        tree::build_forest(self.categories.values(), |model_id| {
            self.model_summary(model_id)
        })
    }

    /// 仅启用节点的分类森林，停用节点连同子树一起剪掉
    pub fn get_active_tree(&self) -> Vec<CategoryNode> {
        tree::prune_inactive(self.get_tree())
    }

    /// 按名称或描述过滤的分类森林，保留匹配节点的祖先
    pub fn filter_tree(&self, query: &str) -> Vec<CategoryNode> {
        tree::filter_forest(&self.get_tree(), query)
    }

    /// 将分类移动到新父节点下（`None` 为根层级）
    ///
    /// 保留原 sort，与新兄弟节点冲突时改为兄弟节点最大 sort + 1
    pub fn move_category(&mut self, id: i64, new_parent_id: Option<i64>) -> Result<Category> {
        let mut category = self.category_ref(id)?.clone();
        self.check_reparent(id, new_parent_id)?;

        if category.parent_id == new_parent_id {
            return Ok(category);
        }

        let siblings: Vec<(i64, i32)> = tree::siblings_of(&self.categories, new_parent_id)
            .into_iter()
            .filter(|c| c.id != id)
            .map(|c| (c.id, c.sort))
            .collect();
        let timestamp = now();
        if siblings.iter().any(|(_, sort)| *sort == category.sort) {
            let max_sort = siblings.iter().map(|(_, sort)| *sort).max().unwrap_or(0);
            category.sort = match max_sort.checked_add(1) {
                Some(sort) => sort,
                None => {
                    // sort 已到上限，新兄弟组重新编号为 0..k，移动节点排在最后
                    for (index, (sibling_id, _)) in siblings.iter().enumerate() {
                        if let Some(sibling) = self.categories.get_mut(sibling_id) {
                            if sibling.sort != index as i32 {
                                sibling.sort = index as i32;
                                sibling.updated_at = timestamp;
                                self.touched.insert(EntityKey::Category(*sibling_id));
                            }
                        }
                    }
                    siblings.len() as i32
                }
            };
        }

        category.parent_id = new_parent_id;
        category.updated_at = timestamp;
        self.categories.insert(id, category.clone());
        self.touch(EntityKey::Category(id));
        Ok(category)
    }

    /// 同级重排
    ///
    /// 节点插到第一个 sort ≥ `sort` 的兄弟之前，然后整组重新编号为 0..k。
    /// 返回重排后的兄弟列表。
    pub fn update_sort(&mut self, id: i64, sort: i32) -> Result<Vec<Category>> {
        let parent_id = self.category_ref(id)?.parent_id;

        let mut order: Vec<i64> = tree::siblings_of(&self.categories, parent_id)
            .into_iter()
            .filter(|c| c.id != id)
            .map(|c| c.id)
            .collect();
        let position = order
            .iter()
            .position(|sibling| self.categories.get(sibling).is_some_and(|c| c.sort >= sort))
            .unwrap_or(order.len());
        order.insert(position, id);

        let timestamp = now();
        let mut result = Vec::with_capacity(order.len());
        for (index, sibling_id) in order.into_iter().enumerate() {
            let Some(sibling) = self.categories.get_mut(&sibling_id) else {
                continue;
            };
            if sibling.sort != index as i32 {
                sibling.sort = index as i32;
                sibling.updated_at = timestamp;
                self.touched.insert(EntityKey::Category(sibling_id));
            }
            result.push(sibling.clone());
        }

        Ok(result)
    }

    /// 环检查：新父节点不能是自身或自身的后代
    fn check_reparent(&self, id: i64, new_parent_id: Option<i64>) -> Result<()> {
        let Some(parent_id) = new_parent_id else {
            return Ok(());
        };
        self.ensure_parent_exists(parent_id)?;
        if tree::is_self_or_descendant(&self.categories, id, parent_id)? {
            return Err(CatalogError::CategoryCycle {
                category_id: id,
                target_parent_id: parent_id,
            });
        }
        Ok(())
    }

    fn ensure_parent_exists(&self, parent_id: i64) -> Result<()> {
        if self.categories.contains_key(&parent_id) {
            Ok(())
        } else {
            Err(CatalogError::validation(format!("父分类不存在: {parent_id}")))
        }
    }

    fn ensure_model_exists(&self, model_id: i64) -> Result<()> {
        if self.models.contains_key(&model_id) {
            Ok(())
        } else {
            Err(CatalogError::validation(format!("内容模型不存在: {model_id}")))
        }
    }

    /// 被删除分类下的内容项失去分类及全部属性值选择
    fn detach_contents(&mut self, removed: &HashSet<i64>) {
        let timestamp = now();
        let mut detached = Vec::new();
        for item in self.contents.values_mut() {
            if item.category_id.is_some_and(|c| removed.contains(&c)) {
                item.category_id = None;
                item.selections.clear();
                item.updated_at = timestamp;
                detached.push(item.id);
            }
        }
        for id in detached {
            self.touch(EntityKey::Content(id));
        }
    }
}

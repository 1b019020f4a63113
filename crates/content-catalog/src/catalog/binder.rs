//! 内容属性值绑定
//!
//! 内容项所在分类决定可用模型，模型决定可选的属性及属性值。
//! 逐个切换的 `set_selection` 按属性的选择模式处理；
//! 表单整体提交的 `attributeValueIds` 则严格校验后整体替换。

use std::collections::{HashMap, HashSet};

use super::dto::{ContentFilter, ContentPatch, NewContent, Page, PageRequest};
use super::{Catalog, EntityKey, bump, now, reconcile_item, require_text};
use crate::error::{CatalogError, Result};
use crate::models::{AttributeSelection, ContentItem, ModelDetail, SelectionSet};
use crate::tree;

impl Catalog {
    /// 解析分类可用的模型
    ///
    /// 只保留模型允许的属性值；分类未绑定模型时返回 `None`
    pub fn resolve_applicable(&self, category_id: i64) -> Result<Option<ModelDetail>> {
        let category = self.category_ref(category_id)?;
        Ok(category
            .model_id
            .and_then(|id| self.models.get(&id))
            .map(|model| self.model_detail(model).into_applicable()))
    }

    /// 切换内容项的一个属性值
    ///
    /// 单选属性替换该属性下的已选值；多选属性切换该值的选中状态
    pub fn set_selection(
        &mut self,
        item_id: i64,
        attribute_id: i64,
        value_id: i64,
    ) -> Result<SelectionSet> {
        let item = self.content_ref(item_id)?;
        let model = self
            .model_of_category(item.category_id)
            .filter(|m| m.binding(attribute_id).is_some())
            .ok_or(CatalogError::AttributeNotInModel { attribute_id })?;
        if !model.allows(attribute_id, value_id) {
            return Err(CatalogError::ValueNotAllowed {
                attribute_id,
                value_id,
            });
        }
        let cardinality = self.attribute_ref(attribute_id)?.cardinality;

        let timestamp = now();
        let Some(item) = self.contents.get_mut(&item_id) else {
            return Err(CatalogError::ContentNotFound(item_id));
        };
        item.selections.apply(cardinality, attribute_id, value_id);
        item.updated_at = timestamp;
        let selections = item.selections.clone();

        self.touch(EntityKey::Content(item_id));
        Ok(selections)
    }

    /// 清空内容项在某属性下的全部选择
    pub fn clear_attribute(&mut self, item_id: i64, attribute_id: i64) -> Result<SelectionSet> {
        let timestamp = now();
        let item = self
            .contents
            .get_mut(&item_id)
            .ok_or(CatalogError::ContentNotFound(item_id))?;

        let changed = item.selections.clear_attribute(attribute_id);
        if changed {
            item.updated_at = timestamp;
        }
        let selections = item.selections.clone();

        if changed {
            self.touch(EntityKey::Content(item_id));
        }
        Ok(selections)
    }

    /// 变更内容项的分类，清理新模型下不合法的选择
    pub fn recategorize(&mut self, item_id: i64, category_id: Option<i64>) -> Result<ContentItem> {
        self.content_ref(item_id)?;
        if let Some(category_id) = category_id {
            self.ensure_category_exists(category_id)?;
        }

        let timestamp = now();
        let Some(item) = self.contents.get_mut(&item_id) else {
            return Err(CatalogError::ContentNotFound(item_id));
        };
        item.category_id = category_id;
        reconcile_item(item, &self.categories, &self.models, &self.attributes);
        item.updated_at = timestamp;
        let item = item.clone();

        self.touch(EntityKey::Content(item_id));
        Ok(item)
    }

    /// 内容项当前的属性值选择
    pub fn selections(&self, item_id: i64) -> Result<Vec<AttributeSelection>> {
        Ok(self
            .content_ref(item_id)?
            .selections
            .iter()
            .copied()
            .collect())
    }

    pub fn create_content(&mut self, input: NewContent) -> Result<ContentItem> {
        let title = require_text("内容标题", &input.title)?;
        if let Some(category_id) = input.category_id {
            self.ensure_category_exists(category_id)?;
        }
        let selections = self.resolve_value_ids(input.category_id, &input.attribute_value_ids)?;

        let id = bump(&mut self.ids.content);
        let timestamp = now();
        let item = ContentItem {
            id,
            title,
            description: input.description,
            sort: input.sort,
            is_active: input.is_active,
            category_id: input.category_id,
            selections,
            created_at: timestamp,
            updated_at: timestamp,
        };

        self.contents.insert(id, item.clone());
        self.touch(EntityKey::Content(id));
        Ok(item)
    }

    /// 更新内容项
    ///
    /// 提交了 `attribute_value_ids` 时按（新）分类的模型严格校验并整体替换；
    /// 未提交但分类变化时，按新模型修剪原有选择
    pub fn update_content(&mut self, id: i64, patch: ContentPatch) -> Result<ContentItem> {
        let mut item = self.content_ref(id)?.clone();

        if let Some(title) = &patch.title {
            item.title = require_text("内容标题", title)?;
        }
        if let Some(description) = patch.description {
            item.description = description;
        }
        if let Some(sort) = patch.sort {
            item.sort = sort;
        }
        if let Some(is_active) = patch.is_active {
            item.is_active = is_active;
        }

        let mut recategorized = false;
        if let Some(category_id) = patch.category_id {
            if let Some(category_id) = category_id {
                self.ensure_category_exists(category_id)?;
            }
            recategorized = item.category_id != category_id;
            item.category_id = category_id;
        }

        match &patch.attribute_value_ids {
            Some(value_ids) => {
                item.selections = self.resolve_value_ids(item.category_id, value_ids)?;
            }
            None if recategorized => {
                reconcile_item(&mut item, &self.categories, &self.models, &self.attributes);
            }
            None => {}
        }

        item.updated_at = now();
        self.contents.insert(id, item.clone());
        self.touch(EntityKey::Content(id));
        Ok(item)
    }

    pub fn delete_content(&mut self, id: i64) -> Result<()> {
        self.content_ref(id)?;
        self.contents.remove(&id);
        self.touch(EntityKey::Content(id));
        Ok(())
    }

    pub fn get_content(&self, id: i64) -> Result<ContentItem> {
        self.content_ref(id).cloned()
    }

    /// 按条件分页查询内容项，结果按 (sort, id) 升序
    pub fn list_contents(&self, filter: &ContentFilter, page: PageRequest) -> Page<ContentItem> {
        let categories: Option<HashSet<i64>> = filter.category_id.map(|root| {
            if filter.include_descendants {
                tree::subtree_ids(&self.categories, root).into_iter().collect()
            } else {
                HashSet::from([root])
            }
        });
        let keyword = filter
            .keyword
            .as_deref()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty());

        let mut matched: Vec<&ContentItem> = self
            .contents
            .values()
            .filter(|item| match &categories {
                Some(ids) => item.category_id.is_some_and(|c| ids.contains(&c)),
                None => true,
            })
            .filter(|item| {
                keyword
                    .as_ref()
                    .is_none_or(|k| item.title.to_lowercase().contains(k))
            })
            .filter(|item| filter.is_active.is_none_or(|active| item.is_active == active))
            .collect();
        matched.sort_by_key(|item| (item.sort, item.id));

        let total = matched.len();
        let items = matched
            .into_iter()
            .skip(page.offset())
            .take(page.page_size as usize)
            .cloned()
            .collect();

        Page {
            items,
            total,
            page: page.page,
            page_size: page.page_size,
        }
    }

    /// 把表单提交的属性值 id 转成选择集合并校验
    fn resolve_value_ids(&self, category_id: Option<i64>, value_ids: &[i64]) -> Result<SelectionSet> {
        if value_ids.is_empty() {
            return Ok(SelectionSet::new());
        }

        let owners: HashMap<i64, i64> = self
            .attributes
            .values()
            .flat_map(|a| a.values.iter().map(move |v| (v.id, a.id)))
            .collect();
        let model = self.model_of_category(category_id);

        let mut selections = SelectionSet::new();
        for value_id in value_ids {
            let attribute_id = *owners
                .get(value_id)
                .ok_or_else(|| CatalogError::validation(format!("属性值不存在: {value_id}")))?;
            let model = model
                .filter(|m| m.binding(attribute_id).is_some())
                .ok_or(CatalogError::AttributeNotInModel { attribute_id })?;
            if !model.allows(attribute_id, *value_id) {
                return Err(CatalogError::ValueNotAllowed {
                    attribute_id,
                    value_id: *value_id,
                });
            }
            selections.insert(attribute_id, *value_id);
        }

        for attribute in self.attributes.values() {
            if !attribute.cardinality.is_single() {
                continue;
            }
            let selected = selections.values_for(attribute.id).len();
            if selected > 1 {
                return Err(CatalogError::CardinalityViolation {
                    attribute_id: attribute.id,
                    selected,
                });
            }
        }

        Ok(selections)
    }

    fn ensure_category_exists(&self, category_id: i64) -> Result<()> {
        if self.categories.contains_key(&category_id) {
            Ok(())
        } else {
            Err(CatalogError::validation(format!("内容分类不存在: {category_id}")))
        }
    }
}

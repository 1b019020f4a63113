//! 内容目录聚合
//!
//! 属性、内容模型、分类和内容项共同组成一个聚合，所有跨实体的不变量
//! （模型绑定不悬空、内容选择始终被所在分类的模型允许、分类树无环）
//! 都在这里的同步操作中维护。每个操作会记录受影响的实体，
//! 由 [`Catalog::take_changes`] 转成变更集交给仓储持久化。
//!
//! ## 模块结构
//!
//! - `attributes`: 属性表
//! - `content_models`: 内容模型表
//! - `categories`: 分类树
//! - `binder`: 内容项及其属性值绑定
//! - `dto`: 命令与查询参数

mod attributes;
mod binder;
mod categories;
mod content_models;
pub mod dto;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};
use crate::models::{Attribute, Category, ContentItem, ContentModel, ModelSummary};

/// 聚合的完整快照，仓储加载与内存存储都以它为单位
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSnapshot {
    pub attributes: Vec<Attribute>,
    pub models: Vec<ContentModel>,
    pub categories: Vec<Category>,
    pub contents: Vec<ContentItem>,
}

/// 单个实体的变更
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogChange {
    UpsertAttribute(Attribute),
    DeleteAttribute(i64),
    UpsertModel(ContentModel),
    DeleteModel(i64),
    UpsertCategory(Category),
    DeleteCategory(i64),
    UpsertContent(ContentItem),
    DeleteContent(i64),
}

impl CatalogChange {
    pub fn is_delete(&self) -> bool {
        matches!(
            self,
            Self::DeleteAttribute(_)
                | Self::DeleteModel(_)
                | Self::DeleteCategory(_)
                | Self::DeleteContent(_)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum EntityKey {
    Attribute(i64),
    Model(i64),
    Category(i64),
    Content(i64),
}

/// 各类实体的 id 序列，单调递增，不复用已删除的 id
#[derive(Debug, Clone, Default)]
struct IdSequence {
    attribute: i64,
    value: i64,
    model: i64,
    category: i64,
    content: i64,
}

fn bump(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

/// 内容目录聚合根
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    attributes: BTreeMap<i64, Attribute>,
    models: BTreeMap<i64, ContentModel>,
    categories: BTreeMap<i64, Category>,
    contents: BTreeMap<i64, ContentItem>,
    ids: IdSequence,
    touched: BTreeSet<EntityKey>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从快照恢复聚合，id 序列从各类实体的最大 id 继续
    pub fn from_snapshot(snapshot: CatalogSnapshot) -> Self {
        let mut catalog = Self::default();

        for mut attribute in snapshot.attributes {
            attribute.sort_values();
            catalog.ids.attribute = catalog.ids.attribute.max(attribute.id);
            for value in &attribute.values {
                catalog.ids.value = catalog.ids.value.max(value.id);
            }
            catalog.attributes.insert(attribute.id, attribute);
        }
        for model in snapshot.models {
            catalog.ids.model = catalog.ids.model.max(model.id);
            catalog.models.insert(model.id, model);
        }
        for category in snapshot.categories {
            catalog.ids.category = catalog.ids.category.max(category.id);
            catalog.categories.insert(category.id, category);
        }
        for content in snapshot.contents {
            catalog.ids.content = catalog.ids.content.max(content.id);
            catalog.contents.insert(content.id, content);
        }

        catalog
    }

    pub fn snapshot(&self) -> CatalogSnapshot {
        CatalogSnapshot {
            attributes: self.attributes.values().cloned().collect(),
            models: self.models.values().cloned().collect(),
            categories: self.categories.values().cloned().collect(),
            contents: self.contents.values().cloned().collect(),
        }
    }

    pub fn has_pending_changes(&self) -> bool {
        !self.touched.is_empty()
    }

    /// 取出自上次调用以来的变更集
    ///
    /// 顺序：先按 属性 → 模型 → 分类（父在前）→ 内容 写入，
    /// 再按 内容 → 分类 → 模型 → 属性 删除，保证引用方总是先于被引用方处理
    pub fn take_changes(&mut self) -> Vec<CatalogChange> {
        let touched = std::mem::take(&mut self.touched);

        let mut upserts = Vec::new();
        let mut category_upserts = Vec::new();
        let mut content_upserts = Vec::new();
        let mut deletes = Vec::new();

        for key in touched {
            match key {
                EntityKey::Attribute(id) => match self.attributes.get(&id) {
                    Some(a) => upserts.push(CatalogChange::UpsertAttribute(a.clone())),
                    None => deletes.push((3, CatalogChange::DeleteAttribute(id))),
                },
                EntityKey::Model(id) => match self.models.get(&id) {
                    Some(m) => upserts.push(CatalogChange::UpsertModel(m.clone())),
                    None => deletes.push((2, CatalogChange::DeleteModel(id))),
                },
                EntityKey::Category(id) => match self.categories.get(&id) {
                    Some(c) => category_upserts.push((self.depth_of(id), c.clone())),
                    None => deletes.push((1, CatalogChange::DeleteCategory(id))),
                },
                EntityKey::Content(id) => match self.contents.get(&id) {
                    Some(c) => content_upserts.push(CatalogChange::UpsertContent(c.clone())),
                    None => deletes.push((0, CatalogChange::DeleteContent(id))),
                },
            }
        }

        category_upserts.sort_by_key(|(depth, c)| (*depth, c.id));
        deletes.sort_by_key(|(rank, _)| *rank);

        upserts
            .into_iter()
            .chain(
                category_upserts
                    .into_iter()
                    .map(|(_, c)| CatalogChange::UpsertCategory(c)),
            )
            .chain(content_upserts)
            .chain(deletes.into_iter().map(|(_, change)| change))
            .collect()
    }

    // === 查询辅助 ===

    pub(crate) fn attribute_ref(&self, id: i64) -> Result<&Attribute> {
        self.attributes
            .get(&id)
            .ok_or(CatalogError::AttributeNotFound(id))
    }

    pub(crate) fn model_ref(&self, id: i64) -> Result<&ContentModel> {
        self.models.get(&id).ok_or(CatalogError::ModelNotFound(id))
    }

    pub(crate) fn category_ref(&self, id: i64) -> Result<&Category> {
        self.categories
            .get(&id)
            .ok_or(CatalogError::CategoryNotFound(id))
    }

    pub(crate) fn content_ref(&self, id: i64) -> Result<&ContentItem> {
        self.contents
            .get(&id)
            .ok_or(CatalogError::ContentNotFound(id))
    }

    /// 分类当前绑定的模型
    pub(crate) fn model_of_category(&self, category_id: Option<i64>) -> Option<&ContentModel> {
        category_id
            .and_then(|id| self.categories.get(&id))
            .and_then(|c| c.model_id)
            .and_then(|id| self.models.get(&id))
    }

    pub(crate) fn model_summary(&self, model_id: i64) -> Option<ModelSummary> {
        self.models.get(&model_id).map(|m| ModelSummary {
            id: m.id,
            name: m.name.clone(),
        })
    }

    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    pub fn content_count(&self) -> usize {
        self.contents.len()
    }

    fn depth_of(&self, id: i64) -> usize {
        let mut depth = 0;
        let mut current = self.categories.get(&id).and_then(|c| c.parent_id);
        while let Some(parent) = current {
            depth += 1;
            if depth > self.categories.len() {
                break;
            }
            current = self.categories.get(&parent).and_then(|c| c.parent_id);
        }
        depth
    }

    // === 变更辅助 ===

    fn touch(&mut self, key: EntityKey) {
        self.touched.insert(key);
    }

    /// 重新校验满足条件的内容项的属性值选择
    ///
    /// 移除不再被所在分类模型允许的选择；单选属性若有多个值，保留排序最靠前的一个
    fn reconcile_contents(&mut self, mut affected: impl FnMut(&ContentItem) -> bool) -> usize {
        let now = Utc::now();
        let mut changed = Vec::new();

        for item in self.contents.values_mut() {
            if !affected(&*item) {
                continue;
            }
            if reconcile_item(item, &self.categories, &self.models, &self.attributes) {
                item.updated_at = now;
                changed.push(item.id);
            }
        }

        for id in &changed {
            self.touch(EntityKey::Content(*id));
        }
        changed.len()
    }
}

fn reconcile_item(
    item: &mut ContentItem,
    categories: &BTreeMap<i64, Category>,
    models: &BTreeMap<i64, ContentModel>,
    attributes: &BTreeMap<i64, Attribute>,
) -> bool {
    let model = item
        .category_id
        .and_then(|id| categories.get(&id))
        .and_then(|c| c.model_id)
        .and_then(|id| models.get(&id));

    let Some(model) = model else {
        return item.selections.clear();
    };

    let mut changed = item.selections.retain(|s| {
        model.allows(s.attribute_id, s.value_id)
            && attributes
                .get(&s.attribute_id)
                .is_some_and(|a| a.has_value(s.value_id))
    });

    let mut per_attribute: HashMap<i64, Vec<i64>> = HashMap::new();
    for selection in item.selections.iter() {
        per_attribute
            .entry(selection.attribute_id)
            .or_default()
            .push(selection.value_id);
    }
    for (attribute_id, values) in per_attribute {
        let Some(attribute) = attributes.get(&attribute_id) else {
            continue;
        };
        if attribute.cardinality.is_single() && values.len() > 1 {
            if let Some(keep) = attribute.first_of(values) {
                item.selections
                    .retain(|s| s.attribute_id != attribute_id || s.value_id == keep);
                changed = true;
            }
        }
    }

    changed
}

/// 去除首尾空白后要求非空
fn require_text(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CatalogError::validation(format!("{field}不能为空")));
    }
    Ok(trimmed.to_string())
}

fn now() -> DateTime<Utc> {
    Utc::now()
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! 单元测试共用的目录构造

    use super::dto::*;
    use super::*;
    use crate::models::Cardinality;

    pub struct Seeded {
        pub catalog: Catalog,
        pub color: i64,
        pub red: i64,
        pub blue: i64,
        pub size: i64,
        pub s: i64,
        pub m: i64,
        pub l: i64,
        pub model: i64,
        pub category: i64,
    }

    pub fn attribute(name: &str, cardinality: Cardinality, values: &[&str]) -> NewAttribute {
        NewAttribute {
            name: name.to_string(),
            cardinality,
            values: values.iter().map(|v| NewAttributeValue::new(*v)).collect(),
            is_active: true,
            sort: 0,
        }
    }

    pub fn category(name: &str, parent_id: Option<i64>, sort: i32) -> NewCategory {
        NewCategory {
            name: name.to_string(),
            sort,
            is_active: true,
            parent_id,
            ..Default::default()
        }
    }

    /// Color(多选 Red/Blue) 与 Size(单选 S/M/L) 全部绑定到模型 M1，分类 C1 使用 M1
    pub fn seeded() -> Seeded {
        let mut catalog = Catalog::new();
        let color = catalog
            .create_attribute(attribute("Color", Cardinality::Multiple, &["Red", "Blue"]))
            .unwrap();
        let size = catalog
            .create_attribute(attribute("Size", Cardinality::Single, &["S", "M", "L"]))
            .unwrap();
        let model = catalog
            .create_model(NewModel {
                name: "M1".to_string(),
                is_active: true,
                attribute_ids: vec![color.id, size.id],
                ..Default::default()
            })
            .unwrap();
        let category = catalog
            .create_category(NewCategory {
                model_id: Some(model.id),
                ..category("C1", None, 0)
            })
            .unwrap();
        catalog.take_changes();

        Seeded {
            red: color.values[0].id,
            blue: color.values[1].id,
            s: size.values[0].id,
            m: size.values[1].id,
            l: size.values[2].id,
            color: color.id,
            size: size.id,
            model: model.id,
            category: category.id,
            catalog,
        }
    }
}

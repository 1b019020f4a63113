//! 目录操作的命令与查询参数
//!
//! Patch 类型中 `None` 表示不修改；可空字段使用 `Option<Option<_>>`，
//! `Some(None)` 表示置空。

use serde::{Deserialize, Serialize};

use crate::models::{Cardinality, ModelAttributeValueRef};

/// 提交的属性值
///
/// 更新属性时带 `id` 的条目匹配已有值（保持 id 不变），不带 `id` 的分配新 id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewAttributeValue {
    pub id: Option<i64>,
    pub value: String,
    pub sort: Option<i32>,
    pub is_active: Option<bool>,
}

impl NewAttributeValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttribute {
    pub name: String,
    pub cardinality: Cardinality,
    pub values: Vec<NewAttributeValue>,
    pub is_active: bool,
    pub sort: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributePatch {
    pub name: Option<String>,
    pub cardinality: Option<Cardinality>,
    pub values: Option<Vec<NewAttributeValue>>,
    pub is_active: Option<bool>,
    pub sort: Option<i32>,
}

/// 创建内容模型
///
/// `value_selections` 中不属于 `attribute_ids` 的条目会被忽略；
/// 某属性没有提交任何值时视为全选
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewModel {
    pub name: String,
    pub description: String,
    pub sort: i32,
    pub is_active: bool,
    pub attribute_ids: Vec<i64>,
    pub value_selections: Vec<ModelAttributeValueRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub sort: Option<i32>,
    pub is_active: Option<bool>,
    pub attribute_ids: Option<Vec<i64>>,
    pub value_selections: Option<Vec<ModelAttributeValueRef>>,
}

impl ModelPatch {
    pub fn touches_bindings(&self) -> bool {
        self.attribute_ids.is_some() || self.value_selections.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
    pub description: String,
    pub sort: i32,
    pub is_active: bool,
    pub parent_id: Option<i64>,
    pub model_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub sort: Option<i32>,
    pub is_active: Option<bool>,
    pub parent_id: Option<Option<i64>>,
    pub model_id: Option<Option<i64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewContent {
    pub title: String,
    pub description: String,
    pub sort: i32,
    pub is_active: bool,
    pub category_id: Option<i64>,
    pub attribute_value_ids: Vec<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub sort: Option<i32>,
    pub is_active: Option<bool>,
    pub category_id: Option<Option<i64>>,
    /// 提供时整体替换并严格校验；不提供但分类变化时按新模型修剪
    pub attribute_value_ids: Option<Vec<i64>>,
}

/// 内容列表过滤条件
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentFilter {
    pub category_id: Option<i64>,
    pub include_descendants: bool,
    /// 标题子串（不区分大小写）
    pub keyword: Option<String>,
    pub is_active: Option<bool>,
}

/// 分页参数，page 从 1 开始
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub const MAX_PAGE_SIZE: u32 = 100;

    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, Self::MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> usize {
        ((self.page - 1) as usize) * self.page_size as usize
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, 20)
    }
}

/// 分页结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: u32,
    pub page_size: u32,
}

//! 内容模型实体定义
//!
//! 模型是一份可复用的属性选择方案：选中若干属性，并为每个属性圈定允许的取值。
//! 对属性和属性值都只是弱引用，属性侧变更时由目录负责修剪。

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::Cardinality;

/// 模型与属性的绑定
///
/// 不变量：`allowed_value_ids` 永不为空
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelAttributeBinding {
    pub attribute_id: i64,
    pub allowed_value_ids: BTreeSet<i64>,
}

/// 内容模型
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentModel {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub sort: i32,
    pub is_active: bool,
    /// 绑定顺序即表单中勾选属性的顺序
    pub bindings: Vec<ModelAttributeBinding>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentModel {
    pub fn binding(&self, attribute_id: i64) -> Option<&ModelAttributeBinding> {
        self.bindings.iter().find(|b| b.attribute_id == attribute_id)
    }

    pub fn attribute_ids(&self) -> Vec<i64> {
        self.bindings.iter().map(|b| b.attribute_id).collect()
    }

    /// 模型是否允许在该属性下选择该值
    pub fn allows(&self, attribute_id: i64, value_id: i64) -> bool {
        self.binding(attribute_id)
            .is_some_and(|b| b.allowed_value_ids.contains(&value_id))
    }
}

/// 模型摘要，挂在分类树节点上
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSummary {
    pub id: i64,
    pub name: String,
}

/// 模型属性值引用，对应 `GET /content-models/{id}/attribute-values`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelAttributeValueRef {
    pub attribute_id: i64,
    pub attribute_value_id: i64,
}

/// 联合视图中的属性值
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelValueView {
    pub id: i64,
    pub value: String,
    pub sort: i32,
    pub is_active: bool,
    pub is_selected: bool,
}

/// 联合视图中的属性
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelAttributeView {
    pub attribute_id: i64,
    pub attribute_name: String,
    pub attribute_type: Cardinality,
    pub values: Vec<ModelValueView>,
}

/// 模型联合视图
///
/// 绑定已按属性表解析出名称、类型及带选中标记的全部属性值
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDetail {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub sort: i32,
    pub is_active: bool,
    pub attributes: Vec<ModelAttributeView>,
}

impl ModelDetail {
    /// 只保留被模型允许的属性值，供内容编辑器选择
    pub fn into_applicable(mut self) -> Self {
        for attribute in &mut self.attributes {
            attribute.values.retain(|v| v.is_selected);
        }
        self.attributes.retain(|a| !a.values.is_empty());
        self
    }
}

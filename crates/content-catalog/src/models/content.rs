//! 内容项实体定义

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::Cardinality;

/// 内容项在某属性下选中的一个值
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeSelection {
    pub attribute_id: i64,
    pub value_id: i64,
}

impl AttributeSelection {
    pub fn new(attribute_id: i64, value_id: i64) -> Self {
        Self {
            attribute_id,
            value_id,
        }
    }
}

/// 内容项的属性值选择集合
///
/// 扁平的 (属性, 值) 集合，某属性的最后一个值被移除后不会留下空占位
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionSet(BTreeSet<AttributeSelection>);

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按属性的选择模式写入一个值
    ///
    /// 单选：替换该属性下的全部已选值；多选：切换该值的选中状态
    pub fn apply(&mut self, cardinality: Cardinality, attribute_id: i64, value_id: i64) {
        let selection = AttributeSelection::new(attribute_id, value_id);
        match cardinality {
            Cardinality::Single => {
                self.clear_attribute(attribute_id);
                self.0.insert(selection);
            }
            Cardinality::Multiple => {
                if !self.0.remove(&selection) {
                    self.0.insert(selection);
                }
            }
        }
    }

    /// 直接插入，不做模式判断（由调用方保证合法）
    pub fn insert(&mut self, attribute_id: i64, value_id: i64) -> bool {
        self.0.insert(AttributeSelection::new(attribute_id, value_id))
    }

    /// 清空某属性下的所有选择，返回是否有变化
    pub fn clear_attribute(&mut self, attribute_id: i64) -> bool {
        let before = self.0.len();
        self.0.retain(|s| s.attribute_id != attribute_id);
        before != self.0.len()
    }

    /// 按条件保留，返回是否有变化
    pub fn retain(&mut self, mut keep: impl FnMut(&AttributeSelection) -> bool) -> bool {
        let before = self.0.len();
        self.0.retain(|s| keep(s));
        before != self.0.len()
    }

    pub fn clear(&mut self) -> bool {
        let changed = !self.0.is_empty();
        self.0.clear();
        changed
    }

    /// 某属性下已选的值
    pub fn values_for(&self, attribute_id: i64) -> Vec<i64> {
        self.0
            .iter()
            .filter(|s| s.attribute_id == attribute_id)
            .map(|s| s.value_id)
            .collect()
    }

    pub fn value_ids(&self) -> Vec<i64> {
        self.0.iter().map(|s| s.value_id).collect()
    }

    pub fn contains(&self, attribute_id: i64, value_id: i64) -> bool {
        self.0
            .contains(&AttributeSelection::new(attribute_id, value_id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttributeSelection> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<AttributeSelection> for SelectionSet {
    fn from_iter<I: IntoIterator<Item = AttributeSelection>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// 内容项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub sort: i32,
    pub is_active: bool,
    pub category_id: Option<i64>,
    #[serde(rename = "attributeValues")]
    pub selections: SelectionSet,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//! 属性及属性值实体定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::Cardinality;

/// 属性值
///
/// 归属于唯一的属性，id 在所有属性之间全局唯一
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeValue {
    pub id: i64,
    pub value: String,
    pub sort: i32,
    pub is_active: bool,
}

/// 可复用属性
///
/// `values` 始终按 (sort, id) 升序保存
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    pub id: i64,
    pub name: String,
    /// 单选 / 多选
    #[serde(rename = "type")]
    pub cardinality: Cardinality,
    pub values: Vec<AttributeValue>,
    pub is_active: bool,
    pub sort: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Attribute {
    /// 按 id 查找属性值
    pub fn value(&self, value_id: i64) -> Option<&AttributeValue> {
        self.values.iter().find(|v| v.id == value_id)
    }

    pub fn has_value(&self, value_id: i64) -> bool {
        self.value(value_id).is_some()
    }

    /// 按展示顺序返回全部属性值 id
    pub fn value_ids(&self) -> Vec<i64> {
        self.values.iter().map(|v| v.id).collect()
    }

    /// 在给定值集合中取排序最靠前的一个（单选收敛时使用）
    pub fn first_of(&self, candidates: impl IntoIterator<Item = i64>) -> Option<i64> {
        let candidates: Vec<i64> = candidates.into_iter().collect();
        self.values
            .iter()
            .find(|v| candidates.contains(&v.id))
            .map(|v| v.id)
    }

    pub(crate) fn sort_values(&mut self) {
        self.values.sort_by_key(|v| (v.sort, v.id));
    }
}

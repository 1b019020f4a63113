//! 内容分类实体定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::content_model::ModelSummary;

/// 内容分类
///
/// 以 `parent_id` 组成森林，`None` 为根节点
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub sort: i32,
    pub is_active: bool,
    pub parent_id: Option<i64>,
    pub model_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 分类树节点
///
/// 每次查询时由扁平分类表物化，不做持久化
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryNode {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub sort: i32,
    pub is_active: bool,
    pub parent_id: Option<i64>,
    pub model_id: Option<i64>,
    pub model: Option<ModelSummary>,
    pub children: Vec<CategoryNode>,
}

impl CategoryNode {
    pub fn leaf(category: &Category, model: Option<ModelSummary>) -> Self {
        Self {
            id: category.id,
            name: category.name.clone(),
            description: category.description.clone(),
            sort: category.sort,
            is_active: category.is_active,
            parent_id: category.parent_id,
            model_id: category.model_id,
            model,
            children: Vec::new(),
        }
    }

    /// 子树节点总数（含自身）
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(CategoryNode::size).sum::<usize>()
    }
}

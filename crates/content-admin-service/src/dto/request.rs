//! 请求 DTO 定义
//!
//! 所有 REST API 的请求体与查询参数。字段统一使用 camelCase。
//!
//! 分类表单在"无父分类/无模型"时提交 `0`，这里统一归一化为 `None`。

use content_catalog::Cardinality;
use content_catalog::dto::{
    AttributePatch, CategoryPatch, ContentFilter, ContentPatch, ModelPatch, NewAttribute,
    NewAttributeValue, NewCategory, NewContent, NewModel, PageRequest,
};
use content_catalog::ModelAttributeValueRef;
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

/// 区分"字段缺省"和"显式 null"
///
/// 配合 `#[serde(default)]` 使用：缺省为 `None`，null 为 `Some(None)`
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// 0 与 null 都表示未关联
fn non_zero(id: Option<i64>) -> Option<i64> {
    id.filter(|id| *id != 0)
}

fn default_true() -> bool {
    true
}

// ==================== 属性 ====================

/// 属性值条目
///
/// 更新时带 `id` 的条目保持原 id
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeValueInput {
    pub id: Option<i64>,
    pub value: String,
    pub sort: Option<i32>,
    pub is_active: Option<bool>,
}

impl From<AttributeValueInput> for NewAttributeValue {
    fn from(input: AttributeValueInput) -> Self {
        Self {
            id: input.id,
            value: input.value,
            sort: input.sort,
            is_active: input.is_active,
        }
    }
}

/// 创建属性请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAttributeRequest {
    #[validate(length(min = 1, max = 50, message = "属性名称长度必须在1-50个字符之间"))]
    pub name: String,
    #[serde(rename = "type", default)]
    pub cardinality: Cardinality,
    #[validate(length(min = 1, message = "至少需要一个属性值"))]
    pub values: Vec<AttributeValueInput>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub sort: i32,
}

impl From<CreateAttributeRequest> for NewAttribute {
    fn from(req: CreateAttributeRequest) -> Self {
        Self {
            name: req.name,
            cardinality: req.cardinality,
            values: req.values.into_iter().map(Into::into).collect(),
            is_active: req.is_active,
            sort: req.sort,
        }
    }
}

/// 更新属性请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAttributeRequest {
    #[validate(length(min = 1, max = 50, message = "属性名称长度必须在1-50个字符之间"))]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub cardinality: Option<Cardinality>,
    #[validate(length(min = 1, message = "至少需要一个属性值"))]
    pub values: Option<Vec<AttributeValueInput>>,
    pub is_active: Option<bool>,
    pub sort: Option<i32>,
}

impl From<UpdateAttributeRequest> for AttributePatch {
    fn from(req: UpdateAttributeRequest) -> Self {
        Self {
            name: req.name,
            cardinality: req.cardinality,
            values: req
                .values
                .map(|values| values.into_iter().map(Into::into).collect()),
            is_active: req.is_active,
            sort: req.sort,
        }
    }
}

/// 属性值排序请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReorderValuesRequest {
    #[validate(length(min = 1, message = "排序列表不能为空"))]
    pub value_ids: Vec<i64>,
}

/// 关键字查询参数
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordQuery {
    pub keyword: Option<String>,
}

impl KeywordQuery {
    /// 去掉首尾空白后的非空关键字
    pub fn keyword(&self) -> Option<&str> {
        self.keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

// ==================== 内容模型 ====================

/// 创建内容模型请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateModelRequest {
    #[validate(length(min = 1, max = 50, message = "模型名称长度必须在1-50个字符之间"))]
    pub name: String,
    #[validate(length(max = 500, message = "描述不能超过500个字符"))]
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sort: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub attribute_ids: Vec<i64>,
    /// 勾选的属性值，只包含已勾选属性的值
    #[serde(default)]
    pub attribute_values: Vec<ModelAttributeValueRef>,
}

impl From<CreateModelRequest> for NewModel {
    fn from(req: CreateModelRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            sort: req.sort,
            is_active: req.is_active,
            attribute_ids: req.attribute_ids,
            value_selections: req.attribute_values,
        }
    }
}

/// 更新内容模型请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateModelRequest {
    #[validate(length(min = 1, max = 50, message = "模型名称长度必须在1-50个字符之间"))]
    pub name: Option<String>,
    #[validate(length(max = 500, message = "描述不能超过500个字符"))]
    pub description: Option<String>,
    pub sort: Option<i32>,
    pub is_active: Option<bool>,
    pub attribute_ids: Option<Vec<i64>>,
    pub attribute_values: Option<Vec<ModelAttributeValueRef>>,
}

impl From<UpdateModelRequest> for ModelPatch {
    fn from(req: UpdateModelRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            sort: req.sort,
            is_active: req.is_active,
            attribute_ids: req.attribute_ids,
            value_selections: req.attribute_values,
        }
    }
}

// ==================== 内容分类 ====================

/// 创建分类请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 50, message = "分类名称长度必须在1-50个字符之间"))]
    pub name: String,
    #[validate(length(max = 500, message = "描述不能超过500个字符"))]
    #[serde(default)]
    pub description: String,
    #[validate(range(min = 0, max = 999_999, message = "排序值必须在0-999999之间"))]
    #[serde(default)]
    pub sort: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub parent_id: Option<i64>,
    pub model_id: Option<i64>,
}

impl From<CreateCategoryRequest> for NewCategory {
    fn from(req: CreateCategoryRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            sort: req.sort,
            is_active: req.is_active,
            parent_id: non_zero(req.parent_id),
            model_id: non_zero(req.model_id),
        }
    }
}

/// 更新分类请求
///
/// `parentId`/`modelId` 缺省表示不修改，null 或 0 表示置空
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 50, message = "分类名称长度必须在1-50个字符之间"))]
    pub name: Option<String>,
    #[validate(length(max = 500, message = "描述不能超过500个字符"))]
    pub description: Option<String>,
    #[validate(range(min = 0, max = 999_999, message = "排序值必须在0-999999之间"))]
    pub sort: Option<i32>,
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub parent_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub model_id: Option<Option<i64>>,
}

impl From<UpdateCategoryRequest> for CategoryPatch {
    fn from(req: UpdateCategoryRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            sort: req.sort,
            is_active: req.is_active,
            parent_id: req.parent_id.map(non_zero),
            model_id: req.model_id.map(non_zero),
        }
    }
}

/// 同级排序请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSortRequest {
    #[validate(range(min = 0, message = "排序值不能为负数"))]
    pub sort: i32,
}

/// 移动分类请求，`parentId` 为 null 或 0 时移到根层级
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveCategoryRequest {
    pub parent_id: Option<i64>,
}

impl MoveCategoryRequest {
    pub fn target(&self) -> Option<i64> {
        non_zero(self.parent_id)
    }
}

/// 删除分类参数，默认级联删除整棵子树
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCategoryQuery {
    #[serde(default = "default_true")]
    pub cascade: bool,
}

// ==================== 内容 ====================

/// 创建内容请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateContentRequest {
    #[validate(length(min = 1, max = 200, message = "标题长度必须在1-200个字符之间"))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sort: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub category_id: Option<i64>,
    #[serde(default)]
    pub attribute_value_ids: Vec<i64>,
}

impl From<CreateContentRequest> for NewContent {
    fn from(req: CreateContentRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            sort: req.sort,
            is_active: req.is_active,
            category_id: non_zero(req.category_id),
            attribute_value_ids: req.attribute_value_ids,
        }
    }
}

/// 更新内容请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContentRequest {
    #[validate(length(min = 1, max = 200, message = "标题长度必须在1-200个字符之间"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub sort: Option<i32>,
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<i64>>,
    pub attribute_value_ids: Option<Vec<i64>>,
}

impl From<UpdateContentRequest> for ContentPatch {
    fn from(req: UpdateContentRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            sort: req.sort,
            is_active: req.is_active,
            category_id: req.category_id.map(non_zero),
            attribute_value_ids: req.attribute_value_ids,
        }
    }
}

/// 设置单个属性值请求
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetSelectionRequest {
    pub attribute_id: i64,
    pub value_id: i64,
}

/// 内容列表查询参数
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentQuery {
    pub category_id: Option<i64>,
    #[serde(default)]
    pub include_descendants: bool,
    pub keyword: Option<String>,
    pub is_active: Option<bool>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl ContentQuery {
    pub fn filter(&self) -> ContentFilter {
        ContentFilter {
            category_id: non_zero(self.category_id),
            include_descendants: self.include_descendants,
            keyword: self
                .keyword
                .as_deref()
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string),
            is_active: self.is_active,
        }
    }

    pub fn page(&self) -> PageRequest {
        let default = PageRequest::default();
        PageRequest::new(
            self.page.unwrap_or(default.page),
            self.page_size.unwrap_or(default.page_size),
        )
    }
}

//! 内容目录错误类型
//!
//! 定义领域层的业务错误和系统错误

use thiserror::Error;

/// 内容目录错误类型
#[derive(Debug, Error)]
pub enum CatalogError {
    // === 实体不存在 ===
    #[error("属性不存在: {0}")]
    AttributeNotFound(i64),

    #[error("内容模型不存在: {0}")]
    ModelNotFound(i64),

    #[error("内容分类不存在: {0}")]
    CategoryNotFound(i64),

    #[error("内容不存在: {0}")]
    ContentNotFound(i64),

    // === 分类树 ===
    #[error("不能将分类 {category_id} 移动到自身或其子分类 {target_parent_id} 下")]
    CategoryCycle {
        category_id: i64,
        target_parent_id: i64,
    },

    #[error("分类 {0} 的父级链损坏，无法到达根节点")]
    CorruptedTree(i64),

    #[error("分类 {category_id} 下还有 {children} 个子分类，请先删除子分类")]
    CategoryHasChildren { category_id: i64, children: usize },

    // === 属性值绑定 ===
    #[error("属性 {attribute_id} 不在分类的内容模型中")]
    AttributeNotInModel { attribute_id: i64 },

    #[error("属性值 {value_id} 不被内容模型允许: attribute_id={attribute_id}")]
    ValueNotAllowed { attribute_id: i64, value_id: i64 },

    #[error("属性 {attribute_id} 为单选，但提交了 {selected} 个值")]
    CardinalityViolation { attribute_id: i64, selected: usize },

    #[error("参数校验失败: {0}")]
    Validation(String),

    // === 系统错误 ===
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("存储错误: {0}")]
    Storage(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 内容目录 Result 类型别名
pub type Result<T> = std::result::Result<T, CatalogError>;

impl CatalogError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// 检查是否为可重试的错误
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Storage(_))
    }

    /// 检查是否为业务错误（非系统错误）
    pub fn is_business_error(&self) -> bool {
        !matches!(
            self,
            Self::Database(_) | Self::Storage(_) | Self::Internal(_) | Self::CorruptedTree(_)
        )
    }

    /// 是否为"实体不存在"类错误
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::AttributeNotFound(_)
                | Self::ModelNotFound(_)
                | Self::CategoryNotFound(_)
                | Self::ContentNotFound(_)
        )
    }

    /// 获取错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AttributeNotFound(_) => "ATTRIBUTE_NOT_FOUND",
            Self::ModelNotFound(_) => "MODEL_NOT_FOUND",
            Self::CategoryNotFound(_) => "CATEGORY_NOT_FOUND",
            Self::ContentNotFound(_) => "CONTENT_NOT_FOUND",
            Self::CategoryCycle { .. } => "CATEGORY_CYCLE",
            Self::CorruptedTree(_) => "CORRUPTED_TREE",
            Self::CategoryHasChildren { .. } => "CATEGORY_HAS_CHILDREN",
            Self::AttributeNotInModel { .. } => "ATTRIBUTE_NOT_IN_MODEL",
            Self::ValueNotAllowed { .. } => "VALUE_NOT_ALLOWED",
            Self::CardinalityViolation { .. } => "CARDINALITY_VIOLATION",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

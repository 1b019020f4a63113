//! 管理后台错误类型定义
//!
//! 领域错误在这里映射为 HTTP 状态码和 API 错误码

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use content_catalog::CatalogError;
use serde_json::json;

/// 管理后台错误类型
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    // 验证错误
    #[error("参数验证失败: {0}")]
    Validation(String),
    /// 属性值选择与分类模型不符
    #[error("{message}")]
    InvalidSelection {
        code: &'static str,
        message: String,
    },

    // 资源不存在
    #[error("属性不存在: {0}")]
    AttributeNotFound(i64),
    #[error("内容模型不存在: {0}")]
    ModelNotFound(i64),
    #[error("内容分类不存在: {0}")]
    CategoryNotFound(i64),
    #[error("内容不存在: {0}")]
    ContentNotFound(i64),

    // 业务冲突
    #[error("{0}")]
    CategoryCycle(String),
    #[error("{0}")]
    CategoryHasChildren(String),

    // 系统错误
    #[error("存储错误: {0}")]
    Storage(String),
    #[error("内部错误: {0}")]
    Internal(String),
}

impl AdminError {
    /// 返回对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidSelection { .. } => StatusCode::BAD_REQUEST,

            Self::AttributeNotFound(_)
            | Self::ModelNotFound(_)
            | Self::CategoryNotFound(_)
            | Self::ContentNotFound(_) => StatusCode::NOT_FOUND,

            Self::CategoryCycle(_) | Self::CategoryHasChildren(_) => StatusCode::CONFLICT,

            Self::Storage(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 返回错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidSelection { code, .. } => *code,
            Self::AttributeNotFound(_) => "ATTRIBUTE_NOT_FOUND",
            Self::ModelNotFound(_) => "MODEL_NOT_FOUND",
            Self::CategoryNotFound(_) => "CATEGORY_NOT_FOUND",
            Self::ContentNotFound(_) => "CONTENT_NOT_FOUND",
            Self::CategoryCycle(_) => "CATEGORY_CYCLE",
            Self::CategoryHasChildren(_) => "CATEGORY_HAS_CHILDREN",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 系统级错误只返回通用提示，详细信息仅记录日志
        let message = match &self {
            Self::Storage(e) => {
                tracing::error!(error = %e, "存储操作失败");
                "服务内部错误，请稍后重试".to_string()
            }
            Self::Internal(e) => {
                tracing::error!(error = %e, "内部错误");
                "服务内部错误，请稍后重试".to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "success": false,
            "code": self.error_code(),
            "message": message,
            "data": serde_json::Value::Null
        });

        (status, axum::Json(body)).into_response()
    }
}

/// 从 validator 错误转换
impl From<validator::ValidationErrors> for AdminError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

/// 从内容目录的领域错误转换
impl From<CatalogError> for AdminError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::AttributeNotFound(id) => Self::AttributeNotFound(id),
            CatalogError::ModelNotFound(id) => Self::ModelNotFound(id),
            CatalogError::CategoryNotFound(id) => Self::CategoryNotFound(id),
            CatalogError::ContentNotFound(id) => Self::ContentNotFound(id),
            CatalogError::Validation(msg) => Self::Validation(msg),
            e @ (CatalogError::AttributeNotInModel { .. }
            | CatalogError::ValueNotAllowed { .. }
            | CatalogError::CardinalityViolation { .. }) => Self::InvalidSelection {
                code: e.error_code(),
                message: e.to_string(),
            },
            e @ CatalogError::CategoryCycle { .. } => Self::CategoryCycle(e.to_string()),
            e @ CatalogError::CategoryHasChildren { .. } => {
                Self::CategoryHasChildren(e.to_string())
            }
            e @ (CatalogError::Database(_) | CatalogError::Storage(_)) => {
                Self::Storage(e.to_string())
            }
            e @ (CatalogError::CorruptedTree(_) | CatalogError::Internal(_)) => {
                Self::Internal(e.to_string())
            }
        }
    }
}

/// 服务层 Result 类型别名
pub type Result<T> = std::result::Result<T, AdminError>;

//! 管理后台 DTO 模块

pub mod request;
pub mod response;

pub use request::{
    AttributeValueInput, ContentQuery, CreateAttributeRequest, CreateCategoryRequest,
    CreateContentRequest, CreateModelRequest, DeleteCategoryQuery, KeywordQuery,
    MoveCategoryRequest, ReorderValuesRequest, SetSelectionRequest, UpdateAttributeRequest,
    UpdateCategoryRequest, UpdateContentRequest, UpdateModelRequest, UpdateSortRequest,
};
pub use response::{ApiResponse, DeletedResponse, PageResponse};

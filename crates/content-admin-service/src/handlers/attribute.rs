//! 属性管理 API 处理器
//!
//! 属性值变更会级联修剪内容模型和内容项的属性值选择

use axum::{
    Json,
    extract::{Path, Query, State},
};
use content_catalog::Attribute;
use tracing::info;
use validator::Validate;

use crate::{
    dto::{
        ApiResponse, CreateAttributeRequest, DeletedResponse, KeywordQuery, ReorderValuesRequest,
        UpdateAttributeRequest,
    },
    error::AdminError,
    state::AppState,
};

/// 创建属性
///
/// POST /api/admin/content-attributes
pub async fn create_attribute(
    State(state): State<AppState>,
    Json(req): Json<CreateAttributeRequest>,
) -> Result<Json<ApiResponse<Attribute>>, AdminError> {
    req.validate()?;

    let attribute = state.catalog.create_attribute(req.into()).await?;

    info!(attribute_id = attribute.id, name = %attribute.name, "Attribute created");
    Ok(Json(ApiResponse::success(attribute)))
}

/// 获取属性列表，带 `keyword` 时按名称过滤
///
/// GET /api/admin/content-attributes
pub async fn list_attributes(
    State(state): State<AppState>,
    Query(query): Query<KeywordQuery>,
) -> Result<Json<ApiResponse<Vec<Attribute>>>, AdminError> {
    let attributes = match query.keyword() {
        Some(keyword) => state.catalog.search_attributes(keyword).await,
        None => state.catalog.list_attributes().await,
    };
    Ok(Json(ApiResponse::success(attributes)))
}

/// 获取属性详情
///
/// GET /api/admin/content-attributes/{id}
pub async fn get_attribute(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Attribute>>, AdminError> {
    let attribute = state.catalog.get_attribute(id).await?;
    Ok(Json(ApiResponse::success(attribute)))
}

/// 更新属性
///
/// PUT /api/admin/content-attributes/{id}
pub async fn update_attribute(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateAttributeRequest>,
) -> Result<Json<ApiResponse<Attribute>>, AdminError> {
    req.validate()?;

    let attribute = state.catalog.update_attribute(id, req.into()).await?;

    info!(attribute_id = id, "Attribute updated");
    Ok(Json(ApiResponse::success(attribute)))
}

/// 删除属性
///
/// DELETE /api/admin/content-attributes/{id}
pub async fn delete_attribute(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<DeletedResponse>>, AdminError> {
    state.catalog.delete_attribute(id).await?;

    info!(attribute_id = id, "Attribute deleted");
    Ok(Json(ApiResponse::success(DeletedResponse::new(id))))
}

/// 属性值排序
///
/// PATCH /api/admin/content-attributes/{id}/values/sort
pub async fn reorder_values(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<ReorderValuesRequest>,
) -> Result<Json<ApiResponse<Attribute>>, AdminError> {
    req.validate()?;

    let attribute = state
        .catalog
        .reorder_attribute_values(id, req.value_ids)
        .await?;
    Ok(Json(ApiResponse::success(attribute)))
}

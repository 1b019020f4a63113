//! 内容管理 API 处理器

use axum::{
    Json,
    extract::{Path, Query, State},
};
use content_catalog::{AttributeSelection, ContentItem, SelectionSet};
use tracing::info;
use validator::Validate;

use crate::{
    dto::{
        ApiResponse, ContentQuery, CreateContentRequest, DeletedResponse, PageResponse,
        SetSelectionRequest, UpdateContentRequest,
    },
    error::AdminError,
    state::AppState,
};

/// 创建内容
///
/// POST /api/admin/contents
pub async fn create_content(
    State(state): State<AppState>,
    Json(req): Json<CreateContentRequest>,
) -> Result<Json<ApiResponse<ContentItem>>, AdminError> {
    req.validate()?;

    let item = state.catalog.create_content(req.into()).await?;

    info!(content_id = item.id, category_id = ?item.category_id, "Content created");
    Ok(Json(ApiResponse::success(item)))
}

/// 分页查询内容
///
/// GET /api/admin/contents
pub async fn list_contents(
    State(state): State<AppState>,
    Query(query): Query<ContentQuery>,
) -> Result<Json<ApiResponse<PageResponse<ContentItem>>>, AdminError> {
    let page = state
        .catalog
        .list_contents(query.filter(), query.page())
        .await;
    Ok(Json(ApiResponse::success(page.into())))
}

/// 获取内容详情
///
/// GET /api/admin/contents/{id}
pub async fn get_content(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ContentItem>>, AdminError> {
    let item = state.catalog.get_content(id).await?;
    Ok(Json(ApiResponse::success(item)))
}

/// 更新内容
///
/// PUT /api/admin/contents/{id}
pub async fn update_content(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateContentRequest>,
) -> Result<Json<ApiResponse<ContentItem>>, AdminError> {
    req.validate()?;

    let item = state.catalog.update_content(id, req.into()).await?;

    info!(content_id = id, "Content updated");
    Ok(Json(ApiResponse::success(item)))
}

/// 删除内容
///
/// DELETE /api/admin/contents/{id}
pub async fn delete_content(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<DeletedResponse>>, AdminError> {
    state.catalog.delete_content(id).await?;

    info!(content_id = id, "Content deleted");
    Ok(Json(ApiResponse::success(DeletedResponse::new(id))))
}

/// 内容的属性值选择
///
/// GET /api/admin/contents/{id}/attribute-values
pub async fn get_selections(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<AttributeSelection>>>, AdminError> {
    let selections = state.catalog.selections(id).await?;
    Ok(Json(ApiResponse::success(selections)))
}

/// 选择属性值：单选替换，多选切换
///
/// POST /api/admin/contents/{id}/attribute-values
pub async fn set_selection(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<SetSelectionRequest>,
) -> Result<Json<ApiResponse<SelectionSet>>, AdminError> {
    let selections = state
        .catalog
        .set_selection(id, req.attribute_id, req.value_id)
        .await?;
    Ok(Json(ApiResponse::success(selections)))
}

/// 清空某属性的选择
///
/// DELETE /api/admin/contents/{id}/attribute-values/{attribute_id}
pub async fn clear_attribute(
    State(state): State<AppState>,
    Path((id, attribute_id)): Path<(i64, i64)>,
) -> Result<Json<ApiResponse<SelectionSet>>, AdminError> {
    let selections = state.catalog.clear_attribute(id, attribute_id).await?;
    Ok(Json(ApiResponse::success(selections)))
}

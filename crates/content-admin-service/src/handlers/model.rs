//! 内容模型 API 处理器

use axum::{
    Json,
    extract::{Path, State},
};
use content_catalog::{ModelAttributeValueRef, ModelDetail};
use tracing::info;
use validator::Validate;

use crate::{
    dto::{ApiResponse, CreateModelRequest, DeletedResponse, UpdateModelRequest},
    error::AdminError,
    state::AppState,
};

/// 创建内容模型
///
/// POST /api/admin/content-models
pub async fn create_model(
    State(state): State<AppState>,
    Json(req): Json<CreateModelRequest>,
) -> Result<Json<ApiResponse<ModelDetail>>, AdminError> {
    req.validate()?;

    let model = state.catalog.create_model(req.into()).await?;
    info!(model_id = model.id, name = %model.name, "Content model created");

    let detail = state.catalog.get_model(model.id).await?;
    Ok(Json(ApiResponse::success(detail)))
}

/// 获取内容模型列表（联合视图）
///
/// GET /api/admin/content-models
pub async fn list_models(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ModelDetail>>>, AdminError> {
    Ok(Json(ApiResponse::success(state.catalog.list_models().await)))
}

/// 获取内容模型详情
///
/// GET /api/admin/content-models/{id}
pub async fn get_model(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ModelDetail>>, AdminError> {
    let detail = state.catalog.get_model(id).await?;
    Ok(Json(ApiResponse::success(detail)))
}

/// 更新内容模型
///
/// PUT /api/admin/content-models/{id}
pub async fn update_model(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateModelRequest>,
) -> Result<Json<ApiResponse<ModelDetail>>, AdminError> {
    req.validate()?;

    state.catalog.update_model(id, req.into()).await?;
    info!(model_id = id, "Content model updated");

    let detail = state.catalog.get_model(id).await?;
    Ok(Json(ApiResponse::success(detail)))
}

/// 删除内容模型
///
/// DELETE /api/admin/content-models/{id}
///
/// 绑定该模型的分类解除绑定
pub async fn delete_model(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<DeletedResponse>>, AdminError> {
    state.catalog.delete_model(id).await?;

    info!(model_id = id, "Content model deleted");
    Ok(Json(ApiResponse::success(DeletedResponse::new(id))))
}

/// 模型绑定的属性 id
///
/// GET /api/admin/content-models/{id}/attributes
pub async fn get_model_attributes(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<i64>>>, AdminError> {
    let ids = state.catalog.get_model_attributes(id).await?;
    Ok(Json(ApiResponse::success(ids)))
}

/// 模型允许的属性值
///
/// GET /api/admin/content-models/{id}/attribute-values
pub async fn get_model_attribute_values(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<ModelAttributeValueRef>>>, AdminError> {
    let refs = state.catalog.get_model_attribute_values(id).await?;
    Ok(Json(ApiResponse::success(refs)))
}

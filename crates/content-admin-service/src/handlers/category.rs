//! 内容分类 API 处理器
//!
//! 分类树每次查询时物化；移动与排序走领域层的环检查和重新编号

use axum::{
    Json,
    extract::{Path, Query, State},
};
use content_catalog::{Category, CategoryNode, ModelDetail};
use tracing::info;
use validator::Validate;

use crate::{
    dto::{
        ApiResponse, CreateCategoryRequest, DeleteCategoryQuery, DeletedResponse, KeywordQuery,
        MoveCategoryRequest, UpdateCategoryRequest, UpdateSortRequest,
    },
    error::AdminError,
    state::AppState,
};

/// 创建分类
///
/// POST /api/admin/content-categories
pub async fn create_category(
    State(state): State<AppState>,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<Json<ApiResponse<Category>>, AdminError> {
    req.validate()?;

    let category = state.catalog.create_category(req.into()).await?;

    info!(
        category_id = category.id,
        parent_id = ?category.parent_id,
        "Category created"
    );
    Ok(Json(ApiResponse::success(category)))
}

/// 获取分类树，带 `keyword` 时保留匹配节点及其祖先
///
/// GET /api/admin/content-categories/tree
pub async fn get_tree(
    State(state): State<AppState>,
    Query(query): Query<KeywordQuery>,
) -> Result<Json<ApiResponse<Vec<CategoryNode>>>, AdminError> {
    let tree = match query.keyword() {
        Some(keyword) => state.catalog.filter_tree(keyword).await,
        None => state.catalog.get_tree().await,
    };
    Ok(Json(ApiResponse::success(tree)))
}

/// 内容编辑使用的分类树，只包含启用的分类
///
/// GET /api/admin/content-categories/content-tree
pub async fn get_content_tree(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<CategoryNode>>>, AdminError> {
    Ok(Json(ApiResponse::success(
        state.catalog.get_active_tree().await,
    )))
}

/// 获取分类详情
///
/// GET /api/admin/content-categories/{id}
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Category>>, AdminError> {
    let category = state.catalog.get_category(id).await?;
    Ok(Json(ApiResponse::success(category)))
}

/// 更新分类
///
/// PUT /api/admin/content-categories/{id}
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateCategoryRequest>,
) -> Result<Json<ApiResponse<Category>>, AdminError> {
    req.validate()?;

    let category = state.catalog.update_category(id, req.into()).await?;

    info!(category_id = id, "Category updated");
    Ok(Json(ApiResponse::success(category)))
}

/// 删除分类
///
/// DELETE /api/admin/content-categories/{id}?cascade=true|false
///
/// 默认级联删除整棵子树；`cascade=false` 时仅允许删除叶子分类
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<DeleteCategoryQuery>,
) -> Result<Json<ApiResponse<DeletedResponse>>, AdminError> {
    let removed = if query.cascade {
        state.catalog.remove_category(id).await?
    } else {
        state.catalog.delete_category(id).await?;
        1
    };

    info!(category_id = id, removed, "Category deleted");
    Ok(Json(ApiResponse::success(DeletedResponse::with_removed(
        id, removed,
    ))))
}

/// 同级排序
///
/// PATCH /api/admin/content-categories/{id}/sort
pub async fn update_category_sort(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateSortRequest>,
) -> Result<Json<ApiResponse<Vec<Category>>>, AdminError> {
    req.validate()?;

    let siblings = state.catalog.update_sort(id, req.sort).await?;
    Ok(Json(ApiResponse::success(siblings)))
}

/// 移动分类
///
/// PATCH /api/admin/content-categories/{id}/move
pub async fn move_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<MoveCategoryRequest>,
) -> Result<Json<ApiResponse<Category>>, AdminError> {
    let target = req.target();
    let category = state.catalog.move_category(id, target).await?;

    info!(category_id = id, parent_id = ?target, "Category moved");
    Ok(Json(ApiResponse::success(category)))
}

/// 分类适用的内容模型（联合视图），未绑定时 data 为 null
///
/// GET /api/admin/content-categories/{id}/model
pub async fn get_category_model(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Option<ModelDetail>>>, AdminError> {
    let model = state.catalog.resolve_applicable(id).await?;
    Ok(Json(ApiResponse::success(model)))
}

//! 路由配置模块
//!
//! 定义所有 REST API 端点的路由映射

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::{handlers, state::AppState};

/// 属性管理路由
fn attribute_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/content-attributes",
            get(handlers::attribute::list_attributes).post(handlers::attribute::create_attribute),
        )
        .route(
            "/content-attributes/{id}",
            get(handlers::attribute::get_attribute)
                .put(handlers::attribute::update_attribute)
                .delete(handlers::attribute::delete_attribute),
        )
        .route(
            "/content-attributes/{id}/values/sort",
            patch(handlers::attribute::reorder_values),
        )
}

/// 内容模型路由
fn model_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/content-models",
            get(handlers::model::list_models).post(handlers::model::create_model),
        )
        .route(
            "/content-models/{id}",
            get(handlers::model::get_model)
                .put(handlers::model::update_model)
                .delete(handlers::model::delete_model),
        )
        .route(
            "/content-models/{id}/attributes",
            get(handlers::model::get_model_attributes),
        )
        .route(
            "/content-models/{id}/attribute-values",
            get(handlers::model::get_model_attribute_values),
        )
}

/// 内容分类路由
fn category_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/content-categories",
            post(handlers::category::create_category),
        )
        .route(
            "/content-categories/tree",
            get(handlers::category::get_tree),
        )
        .route(
            "/content-categories/content-tree",
            get(handlers::category::get_content_tree),
        )
        .route(
            "/content-categories/{id}",
            get(handlers::category::get_category)
                .put(handlers::category::update_category)
                .delete(handlers::category::delete_category),
        )
        .route(
            "/content-categories/{id}/sort",
            patch(handlers::category::update_category_sort),
        )
        .route(
            "/content-categories/{id}/move",
            patch(handlers::category::move_category),
        )
        .route(
            "/content-categories/{id}/model",
            get(handlers::category::get_category_model),
        )
}

/// 内容管理路由
fn content_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/contents",
            get(handlers::content::list_contents).post(handlers::content::create_content),
        )
        .route(
            "/contents/{id}",
            get(handlers::content::get_content)
                .put(handlers::content::update_content)
                .delete(handlers::content::delete_content),
        )
        .route(
            "/contents/{id}/attribute-values",
            get(handlers::content::get_selections).post(handlers::content::set_selection),
        )
        .route(
            "/contents/{id}/attribute-values/{attribute_id}",
            axum::routing::delete(handlers::content::clear_attribute),
        )
}

/// 构建全部管理 API 路由（挂载在 /api/admin 下）
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(attribute_routes())
        .merge(model_routes())
        .merge(category_routes())
        .merge(content_routes())
}

/// 构建完整应用路由，中间件由调用方叠加
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/admin", api_routes())
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .with_state(state)
}

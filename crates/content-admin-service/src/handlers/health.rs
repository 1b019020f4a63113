//! 存活与就绪探针

use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};
use tracing::warn;

use crate::state::AppState;

/// 存活探针：服务进程正常即返回 ok
///
/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": &*state.service_name
    }))
}

/// 就绪探针：检查存储是否可用
///
/// GET /ready
pub async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let storage_ok = match state.catalog.health_check().await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Storage health check failed");
            false
        }
    };

    let status = if storage_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if storage_ok { "ok" } else { "degraded" },
            "service": &*state.service_name,
            "checks": {
                "storage": if storage_ok { "ok" } else { "fail" }
            }
        })),
    )
}

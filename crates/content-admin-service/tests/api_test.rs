//! 管理后台 HTTP API 测试
//!
//! 使用内存仓储构建完整路由，通过 `oneshot` 驱动请求

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use content_admin_service::{AppState, build_router};
use content_catalog::{CatalogRepositoryTrait, MemoryCatalogRepository};
use fake::Fake;
use fake::faker::lorem::en::Word;
use serde_json::{Value, json};
use tower::ServiceExt;

async fn create_test_app() -> Router {
    let repo: Arc<dyn CatalogRepositoryTrait> = Arc::new(MemoryCatalogRepository::new());
    let state = AppState::load(repo, "content-admin-service").await.unwrap();
    build_router(state)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// 创建实体并返回 data
async fn create(app: &Router, uri: &str, body: Value) -> Value {
    let (status, resp) = send(app, Method::POST, uri, Some(body)).await;
    assert_eq!(status, StatusCode::OK, "创建失败: {resp}");
    assert_eq!(resp["success"], true);
    resp["data"].clone()
}

fn id_of(value: &Value) -> i64 {
    value["id"].as_i64().unwrap()
}

/// Color（多选）+ Size（单选），模型绑定两者，分类 C1 使用该模型
struct Seed {
    size: Value,
    model: i64,
    category: i64,
}

async fn seed(app: &Router) -> Seed {
    let color = create(
        app,
        "/api/admin/content-attributes",
        json!({"name": "Color", "type": "multiple", "values": [{"value": "Red"}, {"value": "Blue"}]}),
    )
    .await;
    let size = create(
        app,
        "/api/admin/content-attributes",
        json!({"name": "Size", "type": "single", "values": [{"value": "S"}, {"value": "M"}, {"value": "L"}]}),
    )
    .await;
    let model = create(
        app,
        "/api/admin/content-models",
        json!({"name": "Apparel", "attributeIds": [id_of(&color), id_of(&size)]}),
    )
    .await;
    let category = create(
        app,
        "/api/admin/content-categories",
        json!({"name": "C1", "parentId": 0, "modelId": id_of(&model)}),
    )
    .await;

    Seed {
        size,
        model: id_of(&model),
        category: id_of(&category),
    }
}

mod health_endpoints {
    use super::*;

    #[tokio::test]
    async fn test_health_and_ready() {
        let app = create_test_app().await;

        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "content-admin-service");

        let (status, body) = send(&app, Method::GET, "/ready", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["checks"]["storage"], "ok");
    }
}

mod attribute_api {
    use super::*;

    /// 测试场景：创建后按关键字过滤列表，空白值被丢弃
    #[tokio::test]
    async fn test_create_and_search() {
        let app = create_test_app().await;
        let name: String = Word().fake();

        let created = create(
            &app,
            "/api/admin/content-attributes",
            json!({"name": format!("{name}-material"), "values": [{"value": " Cotton "}, {"value": "  "}]}),
        )
        .await;
        assert_eq!(created["type"], "single");
        assert_eq!(created["values"].as_array().unwrap().len(), 1);
        assert_eq!(created["values"][0]["value"], "Cotton");

        let (_, list) = send(
            &app,
            Method::GET,
            "/api/admin/content-attributes?keyword=MATERIAL",
            None,
        )
        .await;
        assert_eq!(list["data"].as_array().unwrap().len(), 1);

        let (_, list) = send(&app, Method::GET, "/api/admin/content-attributes?keyword=zzz", None).await;
        assert!(list["data"].as_array().unwrap().is_empty());
    }

    /// 测试场景：空名称或空值列表返回 400
    #[tokio::test]
    async fn test_validation_errors() {
        let app = create_test_app().await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/admin/content-attributes",
            Some(json!({"name": "", "values": [{"value": "x"}]})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/admin/content-attributes",
            Some(json!({"name": "Blank", "values": [{"value": "   "}]})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    /// 测试场景：删除属性值后模型只保留剩余值
    #[tokio::test]
    async fn test_value_removal_prunes_model() {
        let app = create_test_app().await;
        let seed = seed(&app).await;
        let size_id = id_of(&seed.size);
        let s = &seed.size["values"][0];

        let (status, _) = send(
            &app,
            Method::PUT,
            &format!("/api/admin/content-attributes/{size_id}"),
            Some(json!({"values": [{"id": s["id"], "value": "S"}]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, refs) = send(
            &app,
            Method::GET,
            &format!("/api/admin/content-models/{}/attribute-values", seed.model),
            None,
        )
        .await;
        let size_refs: Vec<&Value> = refs["data"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|r| r["attributeId"] == json!(size_id))
            .collect();
        assert_eq!(size_refs.len(), 1);
        assert_eq!(size_refs[0]["attributeValueId"], s["id"]);
    }
}

mod category_api {
    use super::*;

    /// 测试场景：B 移到 A 下，再把 A 移到 B 下被拒绝
    #[tokio::test]
    async fn test_move_and_cycle_rejection() {
        let app = create_test_app().await;
        let a = id_of(&create(&app, "/api/admin/content-categories", json!({"name": "A", "sort": 0})).await);
        let b = id_of(&create(&app, "/api/admin/content-categories", json!({"name": "B", "sort": 1})).await);

        let (status, _) = send(
            &app,
            Method::PATCH,
            &format!("/api/admin/content-categories/{b}/move"),
            Some(json!({"parentId": a})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, tree) = send(&app, Method::GET, "/api/admin/content-categories/tree", None).await;
        let roots = tree["data"].as_array().unwrap();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0]["id"], json!(a));
        assert_eq!(roots[0]["children"][0]["id"], json!(b));

        let (status, body) = send(
            &app,
            Method::PATCH,
            &format!("/api/admin/content-categories/{a}/move"),
            Some(json!({"parentId": b})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CATEGORY_CYCLE");
    }

    /// 测试场景：非级联删除有子分类的节点返回 409，默认删除整棵子树
    #[tokio::test]
    async fn test_delete_modes() {
        let app = create_test_app().await;
        let root = id_of(&create(&app, "/api/admin/content-categories", json!({"name": "root"})).await);
        create(
            &app,
            "/api/admin/content-categories",
            json!({"name": "child", "parentId": root}),
        )
        .await;

        let (status, body) = send(
            &app,
            Method::DELETE,
            &format!("/api/admin/content-categories/{root}?cascade=false"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CATEGORY_HAS_CHILDREN");

        let (status, body) = send(
            &app,
            Method::DELETE,
            &format!("/api/admin/content-categories/{root}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["removed"], 2);

        let (status, _) = send(
            &app,
            Method::GET,
            &format!("/api/admin/content-categories/{root}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    /// 测试场景：停用分类不出现在内容编辑分类树中，关键字过滤保留祖先
    #[tokio::test]
    async fn test_content_tree_and_filter() {
        let app = create_test_app().await;
        let root = id_of(&create(&app, "/api/admin/content-categories", json!({"name": "News"})).await);
        create(
            &app,
            "/api/admin/content-categories",
            json!({"name": "Sports", "parentId": root}),
        )
        .await;
        create(
            &app,
            "/api/admin/content-categories",
            json!({"name": "Archive", "isActive": false}),
        )
        .await;

        let (_, tree) = send(&app, Method::GET, "/api/admin/content-categories/content-tree", None).await;
        assert_eq!(tree["data"].as_array().unwrap().len(), 1);

        let (_, filtered) = send(
            &app,
            Method::GET,
            "/api/admin/content-categories/tree?keyword=sport",
            None,
        )
        .await;
        let roots = filtered["data"].as_array().unwrap();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0]["name"], "News");
        assert_eq!(roots[0]["children"][0]["name"], "Sports");
    }

    /// 测试场景：分类适用模型查询，未绑定模型时 data 为 null
    #[tokio::test]
    async fn test_category_model() {
        let app = create_test_app().await;
        let seed = seed(&app).await;
        let bare = id_of(&create(&app, "/api/admin/content-categories", json!({"name": "bare"})).await);

        let (_, body) = send(
            &app,
            Method::GET,
            &format!("/api/admin/content-categories/{}/model", seed.category),
            None,
        )
        .await;
        assert_eq!(body["data"]["id"], json!(seed.model));
        assert_eq!(body["data"]["attributes"].as_array().unwrap().len(), 2);

        let (_, body) = send(
            &app,
            Method::GET,
            &format!("/api/admin/content-categories/{bare}/model"),
            None,
        )
        .await;
        assert!(body["data"].is_null());
    }
}

mod content_api {
    use super::*;

    /// 测试场景：单选属性重新选择时替换，超出单选限制返回 400
    #[tokio::test]
    async fn test_selection_flow() {
        let app = create_test_app().await;
        let seed = seed(&app).await;
        let size_id = id_of(&seed.size);
        let m = seed.size["values"][1]["id"].as_i64().unwrap();
        let l = seed.size["values"][2]["id"].as_i64().unwrap();

        let item = create(
            &app,
            "/api/admin/contents",
            json!({"title": "tee", "categoryId": seed.category, "attributeValueIds": [m]}),
        )
        .await;
        let item_id = id_of(&item);

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/admin/contents/{item_id}/attribute-values"),
            Some(json!({"attributeId": size_id, "valueId": l})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!([{"attributeId": size_id, "valueId": l}]));

        let (status, body) = send(
            &app,
            Method::PUT,
            &format!("/api/admin/contents/{item_id}"),
            Some(json!({"attributeValueIds": [m, l]})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "CARDINALITY_VIOLATION");

        let (status, body) = send(
            &app,
            Method::DELETE,
            &format!("/api/admin/contents/{item_id}/attribute-values/{size_id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!([]));
    }

    /// 测试场景：换到无模型分类后选择清空
    #[tokio::test]
    async fn test_recategorize_purges_selections() {
        let app = create_test_app().await;
        let seed = seed(&app).await;
        let m = seed.size["values"][1]["id"].as_i64().unwrap();
        let c2 = id_of(&create(&app, "/api/admin/content-categories", json!({"name": "C2"})).await);
        let item = create(
            &app,
            "/api/admin/contents",
            json!({"title": "X", "categoryId": seed.category, "attributeValueIds": [m]}),
        )
        .await;
        let item_id = id_of(&item);

        let (status, body) = send(
            &app,
            Method::PUT,
            &format!("/api/admin/contents/{item_id}"),
            Some(json!({"categoryId": c2})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["attributeValues"], json!([]));

        let (_, body) = send(
            &app,
            Method::GET,
            &format!("/api/admin/contents/{item_id}/attribute-values"),
            None,
        )
        .await;
        assert_eq!(body["data"], json!([]));
    }

    /// 测试场景：分页查询返回总数与总页数
    #[tokio::test]
    async fn test_list_pagination() {
        let app = create_test_app().await;
        for i in 0..5 {
            let title: String = Word().fake();
            create(
                &app,
                "/api/admin/contents",
                json!({"title": format!("{title}-{i}"), "sort": i}),
            )
            .await;
        }

        let (status, body) = send(&app, Method::GET, "/api/admin/contents?page=2&pageSize=2", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["total"], 5);
        assert_eq!(body["data"]["totalPages"], 3);
        assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_content_returns_404() {
        let app = create_test_app().await;

        let (status, body) = send(&app, Method::GET, "/api/admin/contents/404", None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "CONTENT_NOT_FOUND");
        assert_eq!(body["success"], false);
    }
}

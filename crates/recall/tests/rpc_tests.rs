//! Integration tests for the JSON-RPC HTTP surface
//!
//! Exercises the axum router in-process with `tower::ServiceExt::oneshot`,
//! covering dispatch, tenant header handling, and error code mapping.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use recall_server::rpc::{AppState, RpcResponse, create_router};
use recall_server::testing::test_engine_arc;

fn test_router() -> Router {
    let state = Arc::new(AppState {
        engine: test_engine_arc(),
    });
    create_router(state)
}

async fn call(app: &Router, tenant: Option<&str>, body: Value) -> RpcResponse {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/rpc")
        .header("content-type", "application/json");
    if let Some(tenant) = tenant {
        builder = builder.header("x-tenant-id", tenant);
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn rpc(method: &str, params: Value) -> Value {
    json!({"jsonrpc": "2.0", "id": 1, "method": method, "params": params})
}

mod protocol_tests {
    use super::*;

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = test_router();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let app = test_router();
        let request = Request::builder()
            .method("POST")
            .uri("/rpc")
            .header("x-tenant-id", "t1")
            .body(Body::from("{not json"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let parsed: RpcResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed.error.unwrap().code, -32700);
    }

    #[tokio::test]
    async fn test_missing_tenant_header_is_rejected() {
        let app = test_router();
        let response = call(&app, None, rpc("memory_stats", json!({}))).await;
        let error = response.error.unwrap();
        assert_eq!(error.code, -32602);
        assert!(error.message.contains("x-tenant-id"));
    }

    #[tokio::test]
    async fn test_unknown_method_is_method_not_found() {
        let app = test_router();
        let response = call(&app, Some("t1"), rpc("memory_explode", json!({}))).await;
        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[tokio::test]
    async fn test_response_echoes_request_id() {
        let app = test_router();
        let body = json!({"jsonrpc": "2.0", "id": "req-77", "method": "memory_stats"});
        let response = call(&app, Some("t1"), body).await;
        assert_eq!(response.id, Some(json!("req-77")));
        assert!(response.result.is_some());
    }
}

mod crud_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_get_update_delete_flow() {
        let app = test_router();

        let created = call(
            &app,
            Some("t1"),
            rpc(
                "memory_create",
                json!({"content": "deploy friday only with signoff", "tags": ["process"]}),
            ),
        )
        .await;
        let memory = created.result.unwrap();
        let id = memory["id"].as_i64().unwrap();
        assert_eq!(memory["memory_type"], "note");

        let fetched = call(&app, Some("t1"), rpc("memory_get", json!({"id": id}))).await;
        assert_eq!(
            fetched.result.unwrap()["content"],
            "deploy friday only with signoff"
        );

        let updated = call(
            &app,
            Some("t1"),
            rpc("memory_update", json!({"id": id, "tags": ["revised"]})),
        )
        .await;
        let updated = updated.result.unwrap();
        assert_eq!(updated["tags"], json!(["revised"]));
        assert_eq!(updated["content"], "deploy friday only with signoff");

        let deleted = call(&app, Some("t1"), rpc("memory_delete", json!({"id": id}))).await;
        assert_eq!(deleted.result.unwrap()["deleted"], true);

        let gone = call(&app, Some("t1"), rpc("memory_get", json!({"id": id}))).await;
        assert_eq!(gone.error.unwrap().code, -32001);
    }

    #[tokio::test]
    async fn test_create_without_content_is_invalid_params() {
        let app = test_router();
        let response = call(&app, Some("t1"), rpc("memory_create", json!({}))).await;
        assert_eq!(response.error.unwrap().code, -32602);
    }

    #[tokio::test]
    async fn test_tenant_isolation_over_the_wire() {
        let app = test_router();
        let created = call(
            &app,
            Some("t1"),
            rpc("memory_create", json!({"content": "tenant one data"})),
        )
        .await;
        let id = created.result.unwrap()["id"].as_i64().unwrap();

        let other = call(&app, Some("t2"), rpc("memory_get", json!({"id": id}))).await;
        assert_eq!(other.error.unwrap().code, -32001);
    }

    #[tokio::test]
    async fn test_list_defaults_and_pagination_shape() {
        let app = test_router();
        for i in 0..3 {
            call(
                &app,
                Some("t1"),
                rpc("memory_create", json!({"content": format!("entry {i}")})),
            )
            .await;
        }

        let listed = call(&app, Some("t1"), rpc("memory_list", json!({"limit": 2}))).await;
        let page = listed.result.unwrap();
        assert_eq!(page["total"], 3);
        assert_eq!(page["limit"], 2);
        assert_eq!(page["offset"], 0);
        assert_eq!(page["memories"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_limit_cap() {
        let app = test_router();
        let response = call(&app, Some("t1"), rpc("memory_list", json!({"limit": 5000}))).await;
        assert_eq!(response.error.unwrap().code, -32602);
    }
}

mod search_and_graph_tests {
    use super::*;

    #[tokio::test]
    async fn test_search_over_the_wire() {
        let app = test_router();
        call(
            &app,
            Some("t1"),
            rpc(
                "memory_create",
                json!({"content": "incident review for the gateway outage"}),
            ),
        )
        .await;

        let response = call(
            &app,
            Some("t1"),
            rpc("memory_search", json!({"query": "gateway outage"})),
        )
        .await;
        let results = response.result.unwrap();
        let results = results["results"].as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0]["score"].as_f64().unwrap() > 0.0);
        assert!(results[0]["scores"]["lexical"].as_f64().is_some());
    }

    #[tokio::test]
    async fn test_search_empty_query_is_invalid_params() {
        let app = test_router();
        let response = call(
            &app,
            Some("t1"),
            rpc("memory_search", json!({"query": "  "})),
        )
        .await;
        assert_eq!(response.error.unwrap().code, -32602);
    }

    #[tokio::test]
    async fn test_link_related_unlink_flow() {
        let app = test_router();
        let a = call(
            &app,
            Some("t1"),
            rpc("memory_create", json!({"content": "first"})),
        )
        .await;
        let b = call(
            &app,
            Some("t1"),
            rpc("memory_create", json!({"content": "second"})),
        )
        .await;
        let a_id = a.result.unwrap()["id"].as_i64().unwrap();
        let b_id = b.result.unwrap()["id"].as_i64().unwrap();

        let linked = call(
            &app,
            Some("t1"),
            rpc(
                "memory_link",
                json!({"from_id": a_id, "to_id": b_id, "edge_type": "supersedes"}),
            ),
        )
        .await;
        assert_eq!(linked.result.unwrap()["created"], true);

        let related = call(&app, Some("t1"), rpc("memory_related", json!({"id": b_id}))).await;
        let related = related.result.unwrap();
        let related = related["related"].as_array().unwrap();
        assert_eq!(related.len(), 1);
        assert_eq!(related[0]["edge_type"], "supersedes");
        assert_eq!(related[0]["direction"], "incoming");
        assert_eq!(related[0]["memory"]["id"].as_i64().unwrap(), a_id);

        let unlinked = call(
            &app,
            Some("t1"),
            rpc(
                "memory_unlink",
                json!({"from_id": a_id, "to_id": b_id, "edge_type": "supersedes"}),
            ),
        )
        .await;
        assert_eq!(unlinked.result.unwrap()["removed"], true);
    }

    #[tokio::test]
    async fn test_link_default_edge_type() {
        let app = test_router();
        let a = call(
            &app,
            Some("t1"),
            rpc("memory_create", json!({"content": "first"})),
        )
        .await;
        let b = call(
            &app,
            Some("t1"),
            rpc("memory_create", json!({"content": "second"})),
        )
        .await;
        let a_id = a.result.unwrap()["id"].as_i64().unwrap();
        let b_id = b.result.unwrap()["id"].as_i64().unwrap();

        call(
            &app,
            Some("t1"),
            rpc("memory_link", json!({"from_id": a_id, "to_id": b_id})),
        )
        .await;

        let related = call(&app, Some("t1"), rpc("memory_related", json!({"id": a_id}))).await;
        let related = related.result.unwrap();
        assert_eq!(related["related"][0]["edge_type"], "related_to");
    }

    #[tokio::test]
    async fn test_link_unknown_edge_type_is_invalid_params() {
        let app = test_router();
        let response = call(
            &app,
            Some("t1"),
            rpc(
                "memory_link",
                json!({"from_id": 1, "to_id": 2, "edge_type": "friend_of"}),
            ),
        )
        .await;
        assert_eq!(response.error.unwrap().code, -32602);
    }

    #[tokio::test]
    async fn test_stats_over_the_wire() {
        let app = test_router();
        call(
            &app,
            Some("t1"),
            rpc(
                "memory_create",
                json!({"content": "a", "memory_type": "decision", "workspace": "proj"}),
            ),
        )
        .await;
        call(
            &app,
            Some("t1"),
            rpc("memory_create", json!({"content": "b"})),
        )
        .await;

        let response = call(&app, Some("t1"), rpc("memory_stats", json!({}))).await;
        let stats = response.result.unwrap();
        assert_eq!(stats["count"], 2);
        assert_eq!(stats["by_type"]["decision"], 1);
        assert_eq!(stats["by_workspace"]["proj"], 1);
    }

    #[tokio::test]
    async fn test_suggest_over_the_wire() {
        let app = test_router();
        call(
            &app,
            Some("t1"),
            rpc("memory_create", json!({"content": "observability dashboards"})),
        )
        .await;

        let response = call(
            &app,
            Some("t1"),
            rpc("memory_search_suggest", json!({"query": "observability"})),
        )
        .await;
        let result = response.result.unwrap();
        assert_eq!(result["original_query"], "observability");
    }
}

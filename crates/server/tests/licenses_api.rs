use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use server::routes;
use server::state::ServerState;
use service::licenses::LicenseService;
use service::storage::{KvStore, MemoryKvStore};

const PASSWORD: &str = "test-admin";
const KEY: &str = "license_users";

fn cors() -> tower_http::cors::CorsLayer { tower_http::cors::CorsLayer::very_permissive() }

fn build_app(store: Arc<dyn KvStore>) -> Router {
    let state = ServerState::new(LicenseService::new(store, KEY, PASSWORD));
    routes::build_router(state, "target/no-frontend-for-tests", cors())
}

fn app() -> Router {
    build_app(Arc::new(MemoryKvStore::new()))
}

async fn send(app: &Router, req: Request<Body>) -> anyhow::Result<(StatusCode, Value)> {
    let resp = app.clone().oneshot(req).await?;
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes)? };
    Ok((status, body))
}

async fn get_all(app: &Router) -> anyhow::Result<(StatusCode, Value)> {
    send(app, Request::builder().method("GET").uri("/api").body(Body::empty())?).await
}

async fn post(app: &Router, body: Value) -> anyhow::Result<(StatusCode, Value)> {
    let req = Request::builder()
        .method("POST")
        .uri("/api")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body)?))?;
    send(app, req).await
}

fn add(id: Value, name: &str) -> Value {
    json!({"password": PASSWORD, "action": "add", "payload": {"id": id, "name": name, "no_wa": "x"}})
}

fn delete(id: Value) -> Value {
    json!({"password": PASSWORD, "action": "delete", "payload": {"id": id}})
}

#[tokio::test]
async fn get_on_empty_store_returns_empty_array() -> anyhow::Result<()> {
    let app = app();
    let (status, body) = get_all(&app).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
    Ok(())
}

#[tokio::test]
async fn documented_example_flow() -> anyhow::Result<()> {
    let app = app();

    let (status, body) = post(&app, add(json!(1), "A")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "data": [{"id": 1, "name": "A", "no_wa": "x"}]}));

    let (status, body) = post(&app, add(json!(1), "A")).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "ID 1 sudah terdaftar!");

    let (status, body) = post(&app, delete(json!(2))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "ID 2 tidak ditemukan.");
    assert_eq!(body["data"], json!([{"id": 1, "name": "A", "no_wa": "x"}]));

    let (status, body) = post(&app, delete(json!(1))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "data": []}));
    Ok(())
}

#[tokio::test]
async fn read_after_mutation_matches_response() -> anyhow::Result<()> {
    let app = app();
    let mut last = Value::Null;
    for (id, name) in [(json!(3), "C"), (json!("10"), "J"), (json!(7.0), "G")] {
        let (status, body) = post(&app, add(id, name)).await?;
        assert_eq!(status, StatusCode::OK);
        last = body["data"].clone();
        let (_, all) = get_all(&app).await?;
        assert_eq!(all, last);
    }
    assert_eq!(last.as_array().map(Vec::len), Some(3));

    let (_, body) = post(&app, delete(json!("10"))).await?;
    let (_, all) = get_all(&app).await?;
    assert_eq!(all, body["data"]);
    assert_eq!(all.as_array().map(Vec::len), Some(2));
    Ok(())
}

#[tokio::test]
async fn added_id_appears_exactly_once() -> anyhow::Result<()> {
    let app = app();
    post(&app, add(json!(5), "E")).await?;
    post(&app, add(json!(5), "E2")).await?;
    let (_, body) = post(&app, add(json!(6), "F")).await?;
    let ids: Vec<u64> = body["data"].as_array().unwrap().iter().filter_map(|r| r["id"].as_u64()).collect();
    assert_eq!(ids.iter().filter(|&&id| id == 5).count(), 1);
    assert_eq!(ids.len(), 2);
    Ok(())
}

#[tokio::test]
async fn wrong_password_is_forbidden_and_changes_nothing() -> anyhow::Result<()> {
    let app = app();
    post(&app, add(json!(1), "A")).await?;
    let (_, before) = get_all(&app).await?;

    let (status, body) = post(&app, json!({"password": "guess", "action": "delete", "payload": {"id": 1}})).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Password Admin Salah! Akses Ditolak.");

    let (status, _) = post(&app, json!({"action": "add", "payload": {"id": 2, "name": "B", "no_wa": "y"}})).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, after) = get_all(&app).await?;
    assert_eq!(before, after);
    Ok(())
}

#[tokio::test]
async fn invalid_ids_are_bad_requests() -> anyhow::Result<()> {
    let app = app();
    for bad in [json!("abc"), json!(0), json!(-4), json!(1.5), json!(null)] {
        let (status, body) = post(&app, add(bad.clone(), "X")).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "id {bad}");
        assert!(body["error"].as_str().unwrap_or_default().starts_with("ID Lisensi"));
    }
    let (status, _) = post(&app, delete(json!("nope"))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, all) = get_all(&app).await?;
    assert_eq!(all, json!([]));
    Ok(())
}

#[tokio::test]
async fn malformed_body_is_bad_request() -> anyhow::Result<()> {
    let app = app();
    let req = Request::builder()
        .method("POST")
        .uri("/api")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))?;
    let (status, body) = send(&app, req).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    Ok(())
}

#[tokio::test]
async fn other_methods_and_unknown_actions_are_405() -> anyhow::Result<()> {
    let app = app();
    for method in ["PUT", "DELETE", "PATCH"] {
        let req = Request::builder().method(method).uri("/api").body(Body::empty())?;
        let (status, body) = send(&app, req).await?;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{method}");
        assert_eq!(body["error"], "Method not allowed");
    }

    let (status, body) = post(&app, json!({"password": PASSWORD, "action": "update", "payload": {"id": 1}})).await?;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["error"], "Method not allowed");
    Ok(())
}

#[tokio::test]
async fn corrupt_store_surfaces_as_500() -> anyhow::Result<()> {
    let store = Arc::new(MemoryKvStore::new());
    store.set(KEY, json!("garbage")).await?;
    let app = build_app(store);

    let (status, body) = get_all(&app).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "storage error"}));

    let (status, body) = post(&app, add(json!(1), "A")).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body.to_string().contains(KEY));
    Ok(())
}

#[tokio::test]
async fn health_and_openapi_are_served() -> anyhow::Result<()> {
    let app = app();
    let (status, body) = send(&app, Request::builder().uri("/health").body(Body::empty())?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send(&app, Request::builder().uri("/api-docs/openapi.json").body(Body::empty())?).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api"].is_object());
    Ok(())
}

//! Integration Tests for API Endpoints
//!
//! Drives the full request/response cycle for each endpoint through the router.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use kvstash::{api::create_router, AppState, Config};
use serde_json::Value;
use tower::ServiceExt;

// == Helper Functions ==

fn create_test_app() -> Router {
    create_router(AppState::in_memory())
}

fn create_sqlite_app() -> Router {
    create_router(AppState::from_config(&Config::default()).unwrap())
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn set_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri("/set")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

// == SET Endpoint Tests ==

#[tokio::test]
async fn test_set_endpoint_success() {
    let app = create_test_app();

    let response = app
        .oneshot(set_request(r#"{"key":"test_key","value":"test_value"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert!(json["message"].as_str().unwrap().contains("test_key"));
    assert_eq!(json["tag"], "");
}

#[tokio::test]
async fn test_set_endpoint_empty_key() {
    let app = create_test_app();

    let response = app
        .oneshot(set_request(r#"{"key":"","value":1}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert!(json.get("error").is_some());
}

#[tokio::test]
async fn test_set_endpoint_bad_expire() {
    let app = create_test_app();

    let response = app
        .oneshot(set_request(r#"{"key":"k","value":1,"expire":"-5s"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_set_endpoint_malformed_json() {
    let app = create_test_app();

    let response = app.oneshot(set_request("not json")).await.unwrap();

    assert!(response.status().is_client_error());
}

// == GET Endpoint Tests ==

#[tokio::test]
async fn test_get_endpoint_returns_value_and_expiration() {
    let app = create_sqlite_app();

    app.clone()
        .oneshot(set_request(
            r#"{"key":"k","value":{"n":[1,2]},"tag":"t","expire":"1h"}"#,
        ))
        .await
        .unwrap();

    let response = app.oneshot(request("GET", "/get/k?tag=t")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["key"], "k");
    assert_eq!(json["tag"], "t");
    assert_eq!(json["value"]["n"][1], 2);
    assert!(json["expire"].is_string());
}

#[tokio::test]
async fn test_get_endpoint_never_expiring() {
    let app = create_test_app();

    app.clone()
        .oneshot(set_request(r#"{"key":"k","value":true,"expire":"never"}"#))
        .await
        .unwrap();

    let response = app.oneshot(request("GET", "/get/k")).await.unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["value"], true);
    assert!(json["expire"].is_null());
}

#[tokio::test]
async fn test_get_endpoint_tags_are_separate() {
    let app = create_test_app();

    app.clone()
        .oneshot(set_request(r#"{"key":"k","value":1,"tag":"a"}"#))
        .await
        .unwrap();

    let response = app.oneshot(request("GET", "/get/k?tag=b")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_endpoint_not_found() {
    let app = create_test_app();

    let response = app
        .oneshot(request("GET", "/get/nonexistent_key"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("nonexistent_key"));
}

// == DELETE / POP Endpoint Tests ==

#[tokio::test]
async fn test_delete_endpoint() {
    let app = create_test_app();

    app.clone()
        .oneshot(set_request(r#"{"key":"gone","value":1}"#))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(request("DELETE", "/del/gone"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(request("GET", "/get/gone")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_endpoint_absent_key() {
    let app = create_test_app();

    let response = app.oneshot(request("DELETE", "/del/ghost")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_pop_endpoint() {
    let app = create_sqlite_app();

    app.clone()
        .oneshot(set_request(r#"{"key":"p","value":"once","tag":"q"}"#))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(request("POST", "/pop/p?tag=q"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["value"], "once");

    let response = app.oneshot(request("POST", "/pop/p?tag=q")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// == Listing Endpoint Tests ==

#[tokio::test]
async fn test_keys_and_stats_endpoints() {
    let app = create_test_app();

    for body in [
        r#"{"key":"b","value":1}"#,
        r#"{"key":"a","value":2,"tag":"z"}"#,
        r#"{"key":"a","value":3}"#,
    ] {
        app.clone().oneshot(set_request(body)).await.unwrap();
    }

    let response = app.clone().oneshot(request("GET", "/keys")).await.unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["count"], 3);
    let keys: Vec<(String, String)> = json["keys"]
        .as_array()
        .unwrap()
        .iter()
        .map(|k| {
            (
                k["key"].as_str().unwrap().to_string(),
                k["tag"].as_str().unwrap().to_string(),
            )
        })
        .collect();
    assert_eq!(
        keys,
        vec![
            ("a".to_string(), "".to_string()),
            ("a".to_string(), "z".to_string()),
            ("b".to_string(), "".to_string()),
        ]
    );

    let response = app.oneshot(request("GET", "/stats")).await.unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["entries"], 3);
}

#[tokio::test]
async fn test_clear_endpoint() {
    let app = create_sqlite_app();

    app.clone()
        .oneshot(set_request(r#"{"key":"x","value":1}"#))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(request("DELETE", "/clear"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(request("GET", "/stats")).await.unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["entries"], 0);
}

// == Health Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();

    let response = app.oneshot(request("GET", "/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "healthy");
    assert!(json.get("timestamp").is_some());
}

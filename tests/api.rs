// tests/api.rs

use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use scano::api::create_router;
use scano::core::config::ScanConfig;
use scano::core::geoip::StaticGeoIp;
use scano::core::scanner::Scanner;
use serde_json::Value;
use tower::ServiceExt;

fn router() -> axum::Router {
    let scanner = Scanner::new(ScanConfig::default(), Arc::new(StaticGeoIp::new())).unwrap();
    create_router(Arc::new(scanner))
}

fn scan_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/scan")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn reserved_target_is_forbidden() {
    let response = router().oneshot(scan_request(r#"{"url": "http://127.0.0.1"}"#)).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = json_body(response).await;
    assert_eq!(body["kind"], "blocked_target");
    assert!(body["error"].as_str().is_some_and(|e| e.contains("127.0.0.1")));
}

#[tokio::test]
async fn private_network_target_is_forbidden() {
    let response = router().oneshot(scan_request(r#"{"url": "192.168.1.10"}"#)).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unsupported_scheme_is_a_bad_request() {
    let response = router().oneshot(scan_request(r#"{"url": "ftp://example.com"}"#)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["kind"], "malformed_input");
}

#[tokio::test]
async fn missing_url_field_is_a_bad_request() {
    let response = router().oneshot(scan_request("{}")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn pdf_endpoint_requires_a_url() {
    let request = Request::builder().uri("/api/scan/pdf").body(Body::empty()).unwrap();
    let response = router().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn pdf_endpoint_blocks_reserved_targets() {
    let request = Request::builder()
        .uri("/api/scan/pdf?url=http://10.0.0.1/")
        .body(Body::empty())
        .unwrap();
    let response = router().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(response).await["kind"], "blocked_target");
}

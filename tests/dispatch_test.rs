use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::json;
use tower::ServiceExt; // for `oneshot`

use routebox::api::endpoints::build_dispatcher;
use routebox::api::state::AppState;
use routebox::config::Config;

/// Creates a minimal config for testing, bypassing file-based loading
fn create_test_config() -> Config {
    let config_toml = r#"
[server]
bind_addr = "127.0.0.1:8080"
max_body_bytes = 1048576

[negotiation]
fallback_media_type = "application/octet-stream"
    "#;

    toml::from_str(config_toml).expect("Failed to parse test config")
}

/// Builds the app with the built-in route table and test config
fn build_test_app() -> Router {
    let config = create_test_config();
    let dispatcher = build_dispatcher(&config).expect("built-in dispatcher must build");
    routebox::api::build_app(AppState::new(config, dispatcher))
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = build_test_app();

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
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );

    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["routes"], 4);
}

#[tokio::test]
async fn test_version_negotiates_text() {
    let app = build_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/version")
                .header(header::ACCEPT, "text/plain")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/plain"
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(bytes.as_ref(), env!("CARGO_PKG_VERSION").as_bytes());
}

#[tokio::test]
async fn test_greet_binds_path_variable() {
    let app = build_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/greet/ferris")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["greeting"], "hello, ferris");
}

#[tokio::test]
async fn test_echo_roundtrip() {
    let app = build_test_app();

    let payload = json!({"job": "fetch", "attempt": 2});
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/echo")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, payload);
}

#[tokio::test]
async fn test_unknown_path_is_404() {
    let app = build_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["code"], "NO_MATCHING_ROUTE");
}

#[tokio::test]
async fn test_wrong_method_is_405_with_allow_header() {
    let app = build_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/echo")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers().get(header::ALLOW).unwrap(), "POST");
    let json = body_json(response).await;
    assert_eq!(json["code"], "METHOD_NOT_ALLOWED");
}

#[tokio::test]
async fn test_unknown_content_type_is_415() {
    let app = build_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/echo")
                .header(header::CONTENT_TYPE, "application/vnd.unknown")
                .body(Body::from("payload"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNSUPPORTED_MEDIA_TYPE");
}

#[tokio::test]
async fn test_unsatisfiable_accept_is_406() {
    let app = build_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/echo")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::ACCEPT, "image/png")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_ACCEPTABLE");
}

#[tokio::test]
async fn test_echo_can_negotiate_xml() {
    let app = build_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/echo")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::ACCEPT, "application/xml")
                .body(Body::from(r#"{"state":"queued"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/xml"
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("<state>queued</state>"));
}

#[tokio::test]
async fn test_malformed_json_body_is_400() {
    let app = build_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/echo")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{broken"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNREADABLE_BODY");
}

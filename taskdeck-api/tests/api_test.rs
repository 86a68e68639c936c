/// Integration tests for the HTTP surface
///
/// These exercise the router, middleware stack, and request validation
/// without a live database: every request here is rejected before a query
/// would run.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use common::test_state;
use serde_json::json;
use taskdeck_api::app::build_router;
use taskdeck_shared::auth::jwt::{create_token, Claims, TokenType};
use tower::ServiceExt as _;
use uuid::Uuid;

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_protected_routes_require_auth() {
    let app = build_router(test_state());

    for uri in [
        "/v1/tasks",
        "/v1/tasks/mine",
        "/v1/users",
        "/v1/notifications",
        "/v1/notifications/unread_count",
    ] {
        let response = app.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "expected 401 for {uri}"
        );
    }
}

#[tokio::test]
async fn test_non_bearer_authorization_is_bad_request() {
    let app = build_router(test_state());

    let request = Request::builder()
        .uri("/v1/tasks")
        .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_garbage_token_is_unauthorized() {
    let app = build_router(test_state());

    let request = Request::builder()
        .uri("/v1/tasks")
        .header(header::AUTHORIZATION, "Bearer not-a-real-token")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_token_rejected_as_access_token() {
    let app = build_router(test_state());

    // A valid, unexpired token of the wrong type must not pass the layer
    let claims = Claims::new(Uuid::new_v4(), TokenType::Refresh);
    let token = create_token(&claims, common::TEST_JWT_SECRET).unwrap();

    let request = Request::builder()
        .uri("/v1/tasks")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_rejects_weak_password() {
    let app = build_router(test_state());

    // Fails strength validation before any database work
    let request = Request::builder()
        .method("POST")
        .uri("/v1/auth/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({
                "username": "jdoe",
                "name": "John Doe",
                "password": "alllowercase1"
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"][0]["field"], "password");
}

#[tokio::test]
async fn test_register_rejects_short_username() {
    let app = build_router(test_state());

    let request = Request::builder()
        .method("POST")
        .uri("/v1/auth/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({
                "username": "ab",
                "name": "John Doe",
                "password": "SecureP@ss123"
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_security_headers_on_responses() {
    let app = build_router(test_state());

    let response = app.oneshot(get("/v1/tasks")).await.unwrap();

    assert_eq!(
        response.headers().get("X-Content-Type-Options").unwrap(),
        "nosniff"
    );
    assert_eq!(response.headers().get("X-Frame-Options").unwrap(), "DENY");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = build_router(test_state());

    let response = app.oneshot(get("/v1/nonexistent")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

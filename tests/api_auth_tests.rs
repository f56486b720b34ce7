// SPDX-License-Identifier: MIT

//! Route-level access control: which endpoints require authentication
//! and which are public.

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::create_test_app;
use tower::ServiceExt; // for oneshot

async fn request_status(method: Method, uri: &str) -> StatusCode {
    let app = create_test_app();

    let mut builder = Request::builder().method(method.clone()).uri(uri);
    let body = if method == Method::GET || method == Method::DELETE {
        Body::empty()
    } else {
        builder = builder.header("Content-Type", "application/json");
        Body::from("{}")
    };

    app.oneshot(builder.body(body).unwrap())
        .await
        .unwrap()
        .status()
}

#[tokio::test]
async fn test_health_check_is_public() {
    assert_eq!(
        request_status(Method::GET, "/api/v1/health").await,
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_root_is_public() {
    assert_eq!(request_status(Method::GET, "/").await, StatusCode::OK);
}

#[tokio::test]
async fn test_listing_reads_are_public() {
    // Mock database errors with 500; the point is that no 401 fires.
    assert_ne!(
        request_status(Method::GET, "/api/v1/listings").await,
        StatusCode::UNAUTHORIZED
    );
    assert_ne!(
        request_status(Method::GET, "/api/v1/listings/some-id").await,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_auth_endpoints_are_public() {
    // Empty bodies fail validation, not authentication.
    assert_eq!(
        request_status(Method::POST, "/api/v1/auth/register").await,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        request_status(Method::POST, "/api/v1/auth/login").await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_protected_endpoints_require_auth() {
    let cases = [
        (Method::GET, "/api/v1/users/me"),
        (Method::PUT, "/api/v1/users/me"),
        (Method::PUT, "/api/v1/users/me/soil-health-card"),
        (Method::POST, "/api/v1/listings"),
        (Method::PUT, "/api/v1/listings/some-id"),
        (Method::DELETE, "/api/v1/listings/some-id"),
        (Method::GET, "/api/v1/profile"),
        (Method::PUT, "/api/v1/profile/farm-details"),
        (Method::PUT, "/api/v1/profile/bank-details"),
        (Method::GET, "/api/v1/profile/analytics"),
        (Method::GET, "/api/v1/profile/export"),
        (Method::POST, "/api/v1/chat"),
        (Method::POST, "/api/v1/chat/text-to-speech"),
        (Method::GET, "/api/v1/chat/conversations"),
        (Method::DELETE, "/api/v1/chat/conversations/some-id"),
    ];

    for (method, uri) in cases {
        let status = request_status(method.clone(), uri).await;
        assert_eq!(
            status,
            StatusCode::UNAUTHORIZED,
            "{} {} should require auth",
            method,
            uri
        );
    }
}

#[tokio::test]
async fn test_unknown_route_is_404_not_401() {
    assert_eq!(
        request_status(Method::GET, "/api/v1/does-not-exist").await,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_security_headers_present() {
    let app = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(headers.get("X-Content-Type-Options").unwrap(), "nosniff");
    assert_eq!(headers.get("X-Frame-Options").unwrap(), "SAMEORIGIN");
}

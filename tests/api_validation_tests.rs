// SPDX-License-Identifier: MIT

//! Request validation tests. Every case here must be rejected before
//! any storage access, so the mock database never gets in the way.

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::{create_test_app, create_test_jwt};
use krishi_sathi_api::models::UserRole;
use serde_json::{json, Value};
use tower::ServiceExt; // for oneshot

async fn send_json(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Value,
) -> (StatusCode, Value) {
    let app = create_test_app();

    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }

    let response = app
        .oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, body)
}

// ─── Registration and login ─────────────────────────────────────

#[tokio::test]
async fn test_register_requires_name_email_password() {
    let (status, body) = send_json(
        Method::POST,
        "/api/v1/auth/register",
        None,
        json!({ "email": "a@b.com", "password": "secret123" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = send_json(
        Method::POST,
        "/api/v1/auth/register",
        None,
        json!({ "name": "Asha", "password": "secret123" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(
        Method::POST,
        "/api/v1/auth/register",
        None,
        json!({ "name": "Asha", "email": "a@b.com" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_rejects_short_password() {
    let (status, body) = send_json(
        Method::POST,
        "/api/v1/auth/register",
        None,
        json!({ "name": "Asha", "email": "a@b.com", "password": "abc" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("at least 6 characters"));
}

#[tokio::test]
async fn test_register_rejects_bad_email() {
    let (status, _) = send_json(
        Method::POST,
        "/api/v1/auth/register",
        None,
        json!({ "name": "Asha", "email": "not-an-email", "password": "secret123" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_rejects_admin_role() {
    let (status, body) = send_json(
        Method::POST,
        "/api/v1/auth/register",
        None,
        json!({ "name": "Asha", "email": "a@b.com", "password": "secret123", "role": "admin" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("farmer or buyer"));
}

#[tokio::test]
async fn test_login_requires_both_fields() {
    let (status, _) = send_json(
        Method::POST,
        "/api/v1/auth/login",
        None,
        json!({ "email": "a@b.com" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(
        Method::POST,
        "/api/v1/auth/login",
        None,
        json!({ "password": "secret123" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ─── Listings ────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_listing_requires_fields() {
    let token = create_test_jwt("user-1", UserRole::Farmer);

    let (status, body) = send_json(
        Method::POST,
        "/api/v1/listings",
        Some(&token),
        json!({ "type": "sell", "quantity": 100.0, "unit": "kg", "price_per_unit": 25.0 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Crop name is required");

    let (status, body) = send_json(
        Method::POST,
        "/api/v1/listings",
        Some(&token),
        json!({ "crop_name": "Wheat", "quantity": 100.0, "unit": "kg", "price_per_unit": 25.0 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Listing type is required");

    let (status, _) = send_json(
        Method::POST,
        "/api/v1/listings",
        Some(&token),
        json!({ "type": "sell", "crop_name": "Wheat", "unit": "kg", "price_per_unit": 25.0 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_listing_rejects_non_positive_numbers() {
    let token = create_test_jwt("user-1", UserRole::Farmer);

    let (status, _) = send_json(
        Method::POST,
        "/api/v1/listings",
        Some(&token),
        json!({ "type": "sell", "crop_name": "Wheat", "quantity": 0.0, "unit": "kg", "price_per_unit": 25.0 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(
        Method::POST,
        "/api/v1/listings",
        Some(&token),
        json!({ "type": "sell", "crop_name": "Wheat", "quantity": 10.0, "unit": "kg", "price_per_unit": -5.0 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_listing_rejects_non_positive_patch() {
    let token = create_test_jwt("user-1", UserRole::Farmer);

    let (status, _) = send_json(
        Method::PUT,
        "/api/v1/listings/some-id",
        Some(&token),
        json!({ "quantity": -1.0 }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ─── Soil health card ────────────────────────────────────────────

#[tokio::test]
async fn test_soil_health_rejects_out_of_range_readings() {
    let token = create_test_jwt("user-1", UserRole::Farmer);

    let (status, body) = send_json(
        Method::PUT,
        "/api/v1/users/me/soil-health-card",
        Some(&token),
        json!({ "ph": 15.0 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("ph"));

    let (status, _) = send_json(
        Method::PUT,
        "/api/v1/users/me/soil-health-card",
        Some(&token),
        json!({ "nitrogen": -10.0 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(
        Method::PUT,
        "/api/v1/users/me/soil-health-card",
        Some(&token),
        json!({ "potassium": 1500.0 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ─── Profile ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_farm_details_rejected_for_buyers() {
    let token = create_test_jwt("buyer-1", UserRole::Buyer);

    let (status, body) = send_json(
        Method::PUT,
        "/api/v1/profile/farm-details",
        Some(&token),
        json!({ "farm_name": "Green Acres" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("farmers"));
}

#[tokio::test]
async fn test_bank_details_rejects_invalid_ifsc() {
    let token = create_test_jwt("user-1", UserRole::Farmer);

    let (status, body) = send_json(
        Method::PUT,
        "/api/v1/profile/bank-details",
        Some(&token),
        json!({ "account_number": "123456789012", "ifsc_code": "hdfc0001234" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid IFSC code");

    let (status, _) = send_json(
        Method::PUT,
        "/api/v1/profile/bank-details",
        Some(&token),
        json!({ "ifsc_code": "HDFC0001234" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ─── Chat ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_chat_requires_message() {
    let token = create_test_jwt("user-1", UserRole::Farmer);

    let (status, body) = send_json(Method::POST, "/api/v1/chat", Some(&token), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Message is required");

    let (status, _) = send_json(
        Method::POST,
        "/api/v1/chat",
        Some(&token),
        json!({ "message": "   " }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_advisory_endpoints_require_inputs() {
    let token = create_test_jwt("user-1", UserRole::Farmer);

    let (status, _) = send_json(
        Method::POST,
        "/api/v1/chat/crop-advice",
        Some(&token),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(
        Method::POST,
        "/api/v1/chat/analyze-pest",
        Some(&token),
        json!({ "crop_type": "wheat" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(
        Method::POST,
        "/api/v1/chat/weather-advice",
        Some(&token),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

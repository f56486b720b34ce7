// SPDX-License-Identifier: MIT

//! HTTP routes and router assembly.

pub mod auth;
pub mod chat;
pub mod listings;
pub mod profile;
pub mod users;

use crate::middleware::{require_auth, security::add_security_headers};
use crate::time_utils::now_rfc3339;
use crate::AppState;
use axum::{
    http::{header, Method},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the application router with all routes and middleware.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = build_cors_layer(&state.config.frontend_url);

    // Everything behind the auth gate. route_layer only fires for
    // matched routes, so unknown paths still 404 instead of 401.
    let protected = Router::new()
        .merge(users::routes())
        .merge(profile::routes())
        .merge(chat::routes())
        .merge(listings::protected_routes())
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    Router::new()
        .route("/", get(root_info))
        .route("/api/v1/health", get(health_check))
        .merge(auth::routes())
        .merge(listings::public_routes())
        .merge(protected)
        .layer(axum::middleware::from_fn(add_security_headers))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS allows the configured frontend plus local development origins,
/// with credentials.
fn build_cors_layer(frontend_url: &str) -> CorsLayer {
    let frontend_url = frontend_url.to_string();

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin, _| {
            origin
                .to_str()
                .map(|o| {
                    o == frontend_url
                        || o.starts_with("http://localhost")
                        || o.starts_with("http://127.0.0.1")
                })
                .unwrap_or(false)
        }))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_credentials(true)
}

/// Root endpoint with API info.
async fn root_info() -> Json<serde_json::Value> {
    Json(json!({
        "name": "Krishi Sathi API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
    }))
}

/// Health check endpoint.
async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "krishi-sathi-api",
        "timestamp": now_rfc3339(),
    }))
}

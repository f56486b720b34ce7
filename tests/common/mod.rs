// SPDX-License-Identifier: MIT

//! Shared test helpers.

#![allow(dead_code)]

use axum::Router;
use krishi_sathi_api::{
    config::Config,
    db::FirestoreDb,
    middleware::auth::create_jwt,
    models::UserRole,
    services::{GeminiService, SpeechService},
    AppState,
};
use std::sync::Arc;

/// Signing key matching `Config::default()`.
pub const TEST_JWT_SECRET: &[u8] = b"test_jwt_key_32_bytes_minimum!!!";

/// Build the full router with a mock (offline) database and
/// unconfigured provider clients.
///
/// Auth and validation run normally; any handler that reaches the
/// database gets a 500 from the mock, so tests assert on everything
/// that happens before storage.
pub fn create_test_app() -> Router {
    let config = Config::default();

    let state = Arc::new(AppState {
        gemini: GeminiService::new(None, config.gemini_model.clone()),
        speech: SpeechService::new(None),
        db: FirestoreDb::new_mock(),
        config,
    });

    krishi_sathi_api::routes::create_router(state)
}

/// Valid one-hour token for the given user.
pub fn create_test_jwt(user_id: &str, role: UserRole) -> String {
    create_jwt(user_id, role, TEST_JWT_SECRET, 3600).expect("Failed to create test JWT")
}

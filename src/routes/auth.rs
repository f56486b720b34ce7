// SPDX-License-Identifier: MIT

//! Registration and login.
//!
//! Passwords are hashed with bcrypt and only the hash is stored. Both
//! login failure modes (unknown email, wrong password) return the same
//! 401 so the endpoint cannot be used to probe which emails exist.

use crate::error::{AppError, Result};
use crate::middleware::auth::create_jwt;
use crate::models::{PublicUser, SoilHealthCard, User, UserRole};
use crate::time_utils::now_rfc3339;
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

const MIN_PASSWORD_LENGTH: usize = 6;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/auth/register", post(register))
        .route("/api/v1/auth/login", post(login))
}

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
    phone: Option<String>,
    role: Option<UserRole>,
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: Option<String>,
    password: Option<String>,
}

/// POST /api/v1/auth/register
async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let name = required_trimmed(payload.name.as_deref(), "Name is required")?;
    let email = required_trimmed(payload.email.as_deref(), "Email is required")?.to_lowercase();
    let password = payload
        .password
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::BadRequest("Password is required".to_string()))?;

    if !email.contains('@') {
        return Err(AppError::BadRequest("Invalid email address".to_string()));
    }

    // Admin accounts are provisioned out of band, never self-registered.
    let role = payload.role.unwrap_or(UserRole::Farmer);
    if role == UserRole::Admin {
        return Err(AppError::BadRequest(
            "Role must be farmer or buyer".to_string(),
        ));
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }

    if state.db.get_user_by_email(&email).await?.is_some() {
        return Err(AppError::BadRequest("Email already registered".to_string()));
    }

    let password_hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {}", e)))?;

    let now = now_rfc3339();
    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        name,
        email,
        phone: payload.phone.filter(|p| !p.trim().is_empty()),
        password_hash,
        role,
        language: payload.language.unwrap_or_else(|| "hi".to_string()),
        location: None,
        soil_health_card: SoilHealthCard::empty(),
        is_verified: false,
        created_at: now.clone(),
        updated_at: now,
    };

    state.db.upsert_user(&user).await?;

    let token = create_jwt(
        &user.id,
        user.role,
        &state.config.jwt_secret,
        state.config.jwt_expiry_secs,
    )?;

    tracing::info!(user_id = %user.id, role = ?user.role, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "token": token,
            "user": PublicUser::from(&user),
        })),
    ))
}

/// POST /api/v1/auth/login
async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<serde_json::Value>> {
    let email = required_trimmed(payload.email.as_deref(), "Email is required")?.to_lowercase();
    let password = payload
        .password
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::BadRequest("Password is required".to_string()))?;

    let user = state
        .db
        .get_user_by_email(&email)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let valid = bcrypt::verify(password, &user.password_hash)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password verification failed: {}", e)))?;
    if !valid {
        return Err(AppError::Unauthorized);
    }

    let token = create_jwt(
        &user.id,
        user.role,
        &state.config.jwt_secret,
        state.config.jwt_expiry_secs,
    )?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(json!({
        "success": true,
        "token": token,
        "user": PublicUser::from(&user),
    })))
}

fn required_trimmed(value: Option<&str>, message: &str) -> Result<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::BadRequest(message.to_string()))
}

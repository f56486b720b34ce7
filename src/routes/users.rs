// SPDX-License-Identifier: MIT

//! Account endpoints for the authenticated user.
//!
//! The soil health card is replaced as a whole record; a reading left
//! out of the request is cleared, not preserved.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{PublicUser, SoilHealthCard, User, UserLocation};
use crate::time_utils::now_rfc3339;
use crate::AppState;
use axum::{
    extract::State,
    routing::{get, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/users/me", get(get_me).put(update_me))
        .route(
            "/api/v1/users/me/soil-health-card",
            put(update_soil_health_card),
        )
}

/// Partial account update. `None` means absent from the request.
#[derive(Debug, Deserialize)]
struct UserPatch {
    name: Option<String>,
    phone: Option<String>,
    language: Option<String>,
    location: Option<UserLocation>,
}

#[derive(Debug, Deserialize)]
struct SoilHealthRequest {
    nitrogen: Option<f64>,
    phosphorus: Option<f64>,
    potassium: Option<f64>,
    ph: Option<f64>,
}

/// GET /api/v1/users/me
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<serde_json::Value>> {
    let user = fetch_user(&state, &auth.user_id).await?;

    Ok(Json(json!({
        "success": true,
        "user": PublicUser::from(&user),
    })))
}

/// PUT /api/v1/users/me
async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(patch): Json<UserPatch>,
) -> Result<Json<serde_json::Value>> {
    let mut user = fetch_user(&state, &auth.user_id).await?;

    if let Some(name) = patch.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::BadRequest("Name cannot be empty".to_string()));
        }
        user.name = name;
    }
    if let Some(phone) = patch.phone {
        user.phone = Some(phone);
    }
    if let Some(language) = patch.language {
        user.language = language;
    }
    if let Some(location) = patch.location {
        user.location = Some(location);
    }
    user.updated_at = now_rfc3339();

    state.db.upsert_user(&user).await?;
    record_profile_change(&state, &user, "profile_updated", "Account details updated").await?;

    Ok(Json(json!({
        "success": true,
        "user": PublicUser::from(&user),
    })))
}

/// PUT /api/v1/users/me/soil-health-card
///
/// Validates readings before touching the database; nothing is written
/// on a validation failure.
async fn update_soil_health_card(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<SoilHealthRequest>,
) -> Result<Json<serde_json::Value>> {
    validate_reading(payload.nitrogen, "nitrogen", 0.0, 1000.0)?;
    validate_reading(payload.phosphorus, "phosphorus", 0.0, 1000.0)?;
    validate_reading(payload.potassium, "potassium", 0.0, 1000.0)?;
    validate_reading(payload.ph, "ph", 0.0, 14.0)?;

    let mut user = fetch_user(&state, &auth.user_id).await?;

    user.soil_health_card = SoilHealthCard {
        nitrogen: payload.nitrogen,
        phosphorus: payload.phosphorus,
        potassium: payload.potassium,
        ph: payload.ph,
        last_updated: Some(now_rfc3339()),
    };
    user.updated_at = now_rfc3339();

    state.db.upsert_user(&user).await?;
    record_profile_change(&state, &user, "soil_health_updated", "Soil health card updated")
        .await?;

    tracing::debug!(user_id = %user.id, "Soil health card replaced");

    Ok(Json(json!({
        "success": true,
        "soil_health_card": user.soil_health_card,
    })))
}

fn validate_reading(value: Option<f64>, field: &str, min: f64, max: f64) -> Result<()> {
    if let Some(v) = value {
        if !v.is_finite() || v < min || v > max {
            return Err(AppError::BadRequest(format!(
                "Invalid {}: must be between {} and {}",
                field, min, max
            )));
        }
    }
    Ok(())
}

/// Log an activity and recompute completion on the extended profile,
/// when one exists. Account updates never create the aggregate.
async fn record_profile_change(
    state: &AppState,
    user: &User,
    action: &str,
    description: &str,
) -> Result<()> {
    if let Some(mut profile) = state.db.get_profile(&user.id).await? {
        profile.add_activity(action, description, None);
        profile.recalculate_completion(user);
        profile.updated_at = now_rfc3339();
        state.db.set_profile(&profile).await?;
    }
    Ok(())
}

async fn fetch_user(state: &AppState, user_id: &str) -> Result<User> {
    state
        .db
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

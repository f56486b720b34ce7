// SPDX-License-Identifier: MIT

//! Extended profile endpoints.
//!
//! The profile aggregate is created lazily on first access. Bank
//! details never leave the API unmasked: the profile read omits them
//! entirely and the bank-details update echoes a masked copy.

use crate::db::ListingQuery;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::profile::{
    is_valid_ifsc, BankDetails, FarmLocation, FarmingType, IrrigationType, LandUnit,
};
use crate::models::{ListingStatus, UserProfile, UserRole};
use crate::services::analytics::{self, Period};
use crate::time_utils::now_rfc3339;
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

const DEFAULT_ACTIVITY_PAGE_SIZE: usize = 20;
const MAX_ACTIVITY_PAGE_SIZE: usize = 100;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/profile", get(get_profile))
        .route("/api/v1/profile/farm-details", put(update_farm_details))
        .route("/api/v1/profile/bank-details", put(update_bank_details))
        .route(
            "/api/v1/profile/notification-preferences",
            put(update_notification_preferences),
        )
        .route("/api/v1/profile/activity-log", get(get_activity_log))
        .route("/api/v1/profile/analytics", get(get_analytics))
        .route("/api/v1/profile/listings", get(get_own_listings))
        .route("/api/v1/profile/export", get(export_profile))
}

#[derive(Debug, Deserialize)]
struct FarmDetailsPatch {
    farm_name: Option<String>,
    total_land_area: Option<f64>,
    land_unit: Option<LandUnit>,
    irrigation_type: Option<IrrigationType>,
    primary_crops: Option<Vec<String>>,
    farming_type: Option<FarmingType>,
    farm_location: Option<FarmLocation>,
}

#[derive(Debug, Deserialize)]
struct BankDetailsRequest {
    account_holder_name: Option<String>,
    account_number: Option<String>,
    ifsc_code: Option<String>,
    bank_name: Option<String>,
    branch: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NotificationPatch {
    email: Option<bool>,
    sms: Option<bool>,
    push: Option<bool>,
    marketing_emails: Option<bool>,
    price_alerts: Option<bool>,
    new_messages: Option<bool>,
    listing_updates: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    page: Option<usize>,
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct AnalyticsQuery {
    period: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwnListingsQuery {
    status: Option<ListingStatus>,
    page: Option<usize>,
    limit: Option<usize>,
}

/// GET /api/v1/profile
///
/// Refreshes cached listing stats and the completion percentage on
/// every read, then persists the refreshed aggregate. The response
/// carries the account alongside a trimmed profile view.
async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<serde_json::Value>> {
    let user = state
        .db
        .get_user(&auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let mut profile = load_or_create(&state, &auth.user_id).await?;

    let listings = state
        .db
        .query_listings(&ListingQuery {
            seller_id: Some(auth.user_id.clone()),
            ..Default::default()
        })
        .await?;

    analytics::refresh_stats(&mut profile.stats, &listings);
    profile.recalculate_completion(&user);
    profile.stats.last_active_at = now_rfc3339();
    profile.updated_at = now_rfc3339();

    state.db.set_profile(&profile).await?;

    Ok(Json(aggregate_response(&user, &profile)))
}

/// Response body for the aggregate read: account plus profile summary.
///
/// Bank details never appear here, and KYC documents and the activity
/// log are left to their own endpoints.
fn aggregate_response(user: &crate::models::User, profile: &UserProfile) -> serde_json::Value {
    json!({
        "success": true,
        "user": crate::models::PublicUser::from(user),
        "profile": {
            "user_id": profile.user_id,
            "profile_completion": profile.profile_completion,
            "farm_details": profile.farm_details,
            "business_details": profile.business_details,
            "kyc_status": profile.kyc_status,
            "kyc_verified_at": profile.kyc_verified_at,
            "stats": profile.stats,
            "preferences": profile.preferences,
            "badges": profile.badges,
            "achievements": profile.achievements,
            "created_at": profile.created_at,
            "updated_at": profile.updated_at,
        },
    })
}

/// PUT /api/v1/profile/farm-details
async fn update_farm_details(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(patch): Json<FarmDetailsPatch>,
) -> Result<Json<serde_json::Value>> {
    if auth.role != UserRole::Farmer {
        return Err(AppError::BadRequest(
            "Only farmers can update farm details".to_string(),
        ));
    }

    if let Some(area) = patch.total_land_area {
        if !area.is_finite() || area <= 0.0 {
            return Err(AppError::BadRequest(
                "Total land area must be a positive number".to_string(),
            ));
        }
    }

    let user = state
        .db
        .get_user(&auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let mut profile = load_or_create(&state, &auth.user_id).await?;

    let mut farm = profile.farm_details.take().unwrap_or_default();
    if let Some(name) = patch.farm_name {
        farm.farm_name = Some(name);
    }
    if let Some(area) = patch.total_land_area {
        farm.total_land_area = Some(area);
    }
    if let Some(unit) = patch.land_unit {
        farm.land_unit = unit;
    }
    if let Some(irrigation) = patch.irrigation_type {
        farm.irrigation_type = Some(irrigation);
    }
    if let Some(crops) = patch.primary_crops {
        farm.primary_crops = crops;
    }
    if let Some(farming_type) = patch.farming_type {
        farm.farming_type = Some(farming_type);
    }
    if let Some(location) = patch.farm_location {
        farm.farm_location = Some(location);
    }
    profile.farm_details = Some(farm);

    profile.add_activity("farm_details_updated", "Farm details updated", None);
    profile.recalculate_completion(&user);
    profile.updated_at = now_rfc3339();

    state.db.set_profile(&profile).await?;

    Ok(Json(json!({
        "success": true,
        "farm_details": profile.farm_details,
        "profile_completion": profile.profile_completion,
    })))
}

/// PUT /api/v1/profile/bank-details
///
/// Replaces the stored bank details and resets verification; a changed
/// account must be re-verified before it counts toward completion.
async fn update_bank_details(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<BankDetailsRequest>,
) -> Result<Json<serde_json::Value>> {
    let account_number = payload
        .account_number
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::BadRequest("Account number is required".to_string()))?
        .to_string();
    let ifsc_code = payload
        .ifsc_code
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest("IFSC code is required".to_string()))?
        .to_string();

    if !is_valid_ifsc(&ifsc_code) {
        return Err(AppError::BadRequest("Invalid IFSC code".to_string()));
    }

    let user = state
        .db
        .get_user(&auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let mut profile = load_or_create(&state, &auth.user_id).await?;

    profile.bank_details = Some(BankDetails {
        account_holder_name: payload.account_holder_name,
        account_number: Some(account_number),
        ifsc_code: Some(ifsc_code),
        bank_name: payload.bank_name,
        branch: payload.branch,
        is_verified: false,
    });

    profile.add_activity("bank_details_updated", "Bank details updated", None);
    profile.recalculate_completion(&user);
    profile.updated_at = now_rfc3339();

    state.db.set_profile(&profile).await?;

    let masked = profile.bank_details.as_ref().map(|b| b.masked());

    Ok(Json(json!({
        "success": true,
        "bank_details": masked,
    })))
}

/// PUT /api/v1/profile/notification-preferences
async fn update_notification_preferences(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(patch): Json<NotificationPatch>,
) -> Result<Json<serde_json::Value>> {
    let mut profile = load_or_create(&state, &auth.user_id).await?;

    let prefs = &mut profile.preferences.notifications;
    if let Some(v) = patch.email {
        prefs.email = v;
    }
    if let Some(v) = patch.sms {
        prefs.sms = v;
    }
    if let Some(v) = patch.push {
        prefs.push = v;
    }
    if let Some(v) = patch.marketing_emails {
        prefs.marketing_emails = v;
    }
    if let Some(v) = patch.price_alerts {
        prefs.price_alerts = v;
    }
    if let Some(v) = patch.new_messages {
        prefs.new_messages = v;
    }
    if let Some(v) = patch.listing_updates {
        prefs.listing_updates = v;
    }

    profile.updated_at = now_rfc3339();
    state.db.set_profile(&profile).await?;

    Ok(Json(json!({
        "success": true,
        "notifications": profile.preferences.notifications,
    })))
}

/// GET /api/v1/profile/activity-log
async fn get_activity_log(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<PageQuery>,
) -> Result<Json<serde_json::Value>> {
    let profile = load_or_create(&state, &auth.user_id).await?;

    let limit = query
        .limit
        .unwrap_or(DEFAULT_ACTIVITY_PAGE_SIZE)
        .clamp(1, MAX_ACTIVITY_PAGE_SIZE);
    let page = query.page.unwrap_or(1).max(1);

    let total = profile.recent_activities.len();
    let pages = total.div_ceil(limit);
    let activities: Vec<_> = profile
        .recent_activities
        .iter()
        .skip((page - 1) * limit)
        .take(limit)
        .collect();

    Ok(Json(json!({
        "success": true,
        "activities": activities,
        "total": total,
        "page": page,
        "pages": pages,
    })))
}

/// GET /api/v1/profile/analytics
async fn get_analytics(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<serde_json::Value>> {
    let period = Period::parse(query.period.as_deref());

    let listings = state
        .db
        .query_listings(&ListingQuery {
            seller_id: Some(auth.user_id.clone()),
            ..Default::default()
        })
        .await?;

    let report = analytics::build_analytics(&listings, period, chrono::Utc::now());

    Ok(Json(json!({
        "success": true,
        "analytics": report,
    })))
}

/// GET /api/v1/profile/listings
async fn get_own_listings(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<OwnListingsQuery>,
) -> Result<Json<serde_json::Value>> {
    let listings = state
        .db
        .query_listings(&ListingQuery {
            seller_id: Some(auth.user_id.clone()),
            listing_type: None,
            status: query.status.map(|s| s.as_str().to_string()),
        })
        .await?;

    Ok(Json(super::listings::paginate(
        listings,
        query.page,
        query.limit,
    )))
}

/// GET /api/v1/profile/export
///
/// Full data export as a JSON attachment. Bank details are masked.
async fn export_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Response> {
    let user = state
        .db
        .get_user(&auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let mut profile = load_or_create(&state, &auth.user_id).await?;
    profile.bank_details = profile.bank_details.as_ref().map(|b| b.masked());

    let listings = state
        .db
        .query_listings(&ListingQuery {
            seller_id: Some(auth.user_id.clone()),
            ..Default::default()
        })
        .await?;

    let conversations = state.db.query_conversations(&auth.user_id).await?;

    let export = json!({
        "user": crate::models::PublicUser::from(&user),
        "profile": profile,
        "listings": listings,
        "conversations": conversations,
        "exported_at": now_rfc3339(),
    });

    let filename = format!(
        "krishi-sathi-profile-{}-{}.json",
        auth.user_id,
        chrono::Utc::now().timestamp_millis()
    );

    let body = serde_json::to_vec_pretty(&export).map_err(anyhow::Error::from)?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response())
}

async fn load_or_create(state: &AppState, user_id: &str) -> Result<UserProfile> {
    Ok(state
        .db
        .get_profile(user_id)
        .await?
        .unwrap_or_else(|| UserProfile::new(user_id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::KycStatus;
    use crate::models::{SoilHealthCard, User, UserRole};

    fn make_user() -> User {
        User {
            id: "u1".to_string(),
            name: "Devansh".to_string(),
            email: "devansh@example.com".to_string(),
            phone: Some("9876543210".to_string()),
            password_hash: "hash".to_string(),
            role: UserRole::Farmer,
            language: "hi".to_string(),
            location: None,
            soil_health_card: SoilHealthCard::empty(),
            is_verified: false,
            created_at: "2025-01-01T00:00:00Z".to_string(),
            updated_at: "2025-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_aggregate_response_includes_user_and_profile() {
        let user = make_user();
        let mut profile = UserProfile::new(&user.id);
        profile.kyc_status = KycStatus::Pending;

        let body = aggregate_response(&user, &profile);

        assert_eq!(body["success"], true);
        assert_eq!(body["user"]["id"], "u1");
        assert_eq!(body["user"]["email"], "devansh@example.com");
        assert_eq!(body["profile"]["user_id"], "u1");
        assert_eq!(body["profile"]["kyc_status"], "pending");
        assert!(body["profile"]["stats"].is_object());
    }

    #[test]
    fn test_aggregate_response_omits_sensitive_fields() {
        let user = make_user();
        let mut profile = UserProfile::new(&user.id);
        profile.bank_details = Some(BankDetails {
            account_number: Some("123456789012".to_string()),
            ifsc_code: Some("HDFC0001234".to_string()),
            ..Default::default()
        });
        profile.add_activity("test", "entry", None);

        let body = aggregate_response(&user, &profile);

        let profile_view = body["profile"].as_object().unwrap();
        assert!(!profile_view.contains_key("bank_details"));
        assert!(!profile_view.contains_key("documents"));
        assert!(!profile_view.contains_key("recent_activities"));

        let user_view = body["user"].as_object().unwrap();
        assert!(!user_view.contains_key("password_hash"));
    }
}

// SPDX-License-Identifier: MIT

//! Crop listing endpoints.
//!
//! Browsing and single-listing reads are public; creation, updates, and
//! deletion require authentication and only succeed for the owner.
//! Equality filters run in Firestore, crop-name substring matching and
//! pagination run in memory over the filtered set.

use crate::db::ListingQuery;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Listing, ListingLocation, ListingPatch, ListingStatus, ListingType};
use crate::time_utils::now_rfc3339;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

const DEFAULT_PAGE_SIZE: usize = 10;
const MAX_PAGE_SIZE: usize = 100;

pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/listings", get(browse_listings))
        .route("/api/v1/listings/{id}", get(get_listing))
}

pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/listings", post(create_listing))
        .route(
            "/api/v1/listings/{id}",
            axum::routing::put(update_listing).delete(delete_listing),
        )
}

#[derive(Debug, Deserialize)]
struct BrowseQuery {
    #[serde(rename = "type")]
    listing_type: Option<ListingType>,
    status: Option<ListingStatus>,
    /// Case-insensitive crop name substring
    crop: Option<String>,
    page: Option<usize>,
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct CreateListingRequest {
    #[serde(rename = "type")]
    listing_type: Option<ListingType>,
    crop_name: Option<String>,
    quantity: Option<f64>,
    unit: Option<String>,
    price_per_unit: Option<f64>,
    images: Option<Vec<String>>,
    description: Option<String>,
    location: Option<ListingLocation>,
    expiry_date: Option<String>,
}

/// GET /api/v1/listings
///
/// Public browse. Defaults to active listings; pass `status` explicitly
/// to see sold or expired ones.
async fn browse_listings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BrowseQuery>,
) -> Result<Json<serde_json::Value>> {
    let status = query.status.unwrap_or(ListingStatus::Active);

    let filter = ListingQuery {
        seller_id: None,
        listing_type: query.listing_type.map(|t| t.as_str().to_string()),
        status: Some(status.as_str().to_string()),
    };

    let mut listings = state.db.query_listings(&filter).await?;

    if let Some(crop) = &query.crop {
        let needle = crop.to_lowercase();
        listings.retain(|l| l.crop_name.to_lowercase().contains(&needle));
    }

    Ok(Json(paginate(listings, query.page, query.limit)))
}

/// GET /api/v1/listings/{id}
///
/// Bumps the soft view counter. The increment is best-effort and never
/// fails the read.
async fn get_listing(
    State(state): State<Arc<AppState>>,
    Path(listing_id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let mut listing = state
        .db
        .get_listing(&listing_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Listing not found".to_string()))?;

    listing.views += 1;
    if let Err(e) = state.db.upsert_listing(&listing).await {
        tracing::warn!(listing_id = %listing_id, error = %e, "View counter update failed");
    }

    Ok(Json(json!({
        "success": true,
        "listing": listing,
    })))
}

/// POST /api/v1/listings
async fn create_listing(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<CreateListingRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let listing_type = payload
        .listing_type
        .ok_or_else(|| AppError::BadRequest("Listing type is required".to_string()))?;
    let crop_name = payload
        .crop_name
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest("Crop name is required".to_string()))?
        .to_string();
    let quantity = payload
        .quantity
        .ok_or_else(|| AppError::BadRequest("Quantity is required".to_string()))?;
    let unit = payload
        .unit
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::BadRequest("Unit is required".to_string()))?
        .to_string();
    let price_per_unit = payload
        .price_per_unit
        .ok_or_else(|| AppError::BadRequest("Price per unit is required".to_string()))?;

    validate_positive(quantity, "Quantity")?;
    validate_positive(price_per_unit, "Price per unit")?;

    let now = now_rfc3339();
    let listing = Listing {
        id: uuid::Uuid::new_v4().to_string(),
        seller_id: auth.user_id.clone(),
        listing_type,
        crop_name,
        quantity,
        unit,
        price_per_unit,
        images: payload.images.unwrap_or_default(),
        description: payload.description,
        location: payload.location,
        status: ListingStatus::Active,
        expiry_date: payload.expiry_date,
        views: 0,
        created_at: now.clone(),
        updated_at: now,
    };

    state.db.upsert_listing(&listing).await?;

    tracing::info!(listing_id = %listing.id, seller_id = %auth.user_id, "Listing created");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "listing": listing,
        })),
    ))
}

/// PUT /api/v1/listings/{id}
async fn update_listing(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(listing_id): Path<String>,
    Json(patch): Json<ListingPatch>,
) -> Result<Json<serde_json::Value>> {
    if let Some(quantity) = patch.quantity {
        validate_positive(quantity, "Quantity")?;
    }
    if let Some(price) = patch.price_per_unit {
        validate_positive(price, "Price per unit")?;
    }

    let listing = state
        .db
        .update_listing_owned(&listing_id, &auth.user_id, &patch)
        .await?;

    Ok(Json(json!({
        "success": true,
        "listing": listing,
    })))
}

/// DELETE /api/v1/listings/{id}
async fn delete_listing(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(listing_id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    state
        .db
        .delete_listing_owned(&listing_id, &auth.user_id)
        .await?;

    tracing::info!(listing_id = %listing_id, seller_id = %auth.user_id, "Listing deleted");

    Ok(Json(json!({
        "success": true,
        "message": "Listing deleted",
    })))
}

fn validate_positive(value: f64, field: &str) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(AppError::BadRequest(format!(
            "{} must be a positive number",
            field
        )));
    }
    Ok(())
}

/// Slice a full result set into one page plus paging metadata.
pub(crate) fn paginate(listings: Vec<Listing>, page: Option<usize>, limit: Option<usize>) -> serde_json::Value {
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let page = page.unwrap_or(1).max(1);

    let total = listings.len();
    let pages = total.div_ceil(limit);
    let items: Vec<Listing> = listings
        .into_iter()
        .skip((page - 1) * limit)
        .take(limit)
        .collect();

    json!({
        "success": true,
        "items": items,
        "total": total,
        "page": page,
        "pages": pages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_listing(id: &str) -> Listing {
        Listing {
            id: id.to_string(),
            seller_id: "u1".to_string(),
            listing_type: ListingType::Sell,
            crop_name: "Wheat".to_string(),
            quantity: 100.0,
            unit: "kg".to_string(),
            price_per_unit: 25.0,
            images: vec![],
            description: None,
            location: None,
            status: ListingStatus::Active,
            expiry_date: None,
            views: 0,
            created_at: "2025-01-01T00:00:00Z".to_string(),
            updated_at: "2025-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_paginate_slices_and_counts() {
        let listings: Vec<Listing> = (0..45).map(|i| make_listing(&format!("l{}", i))).collect();

        let page = paginate(listings, Some(2), Some(20));
        assert_eq!(page["total"], 45);
        assert_eq!(page["pages"], 3);
        assert_eq!(page["page"], 2);

        let items = page["items"].as_array().unwrap();
        assert_eq!(items.len(), 20);
        assert_eq!(items[0]["id"], "l20");
    }

    #[test]
    fn test_paginate_clamps_limit_and_page() {
        let listings: Vec<Listing> = (0..5).map(|i| make_listing(&format!("l{}", i))).collect();

        let page = paginate(listings.clone(), Some(0), Some(500));
        assert_eq!(page["page"], 1);
        assert_eq!(page["pages"], 1);
        assert_eq!(page["items"].as_array().unwrap().len(), 5);

        let empty_page = paginate(listings, Some(9), Some(20));
        assert!(empty_page["items"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_validate_positive() {
        assert!(validate_positive(1.0, "Quantity").is_ok());
        assert!(validate_positive(0.0, "Quantity").is_err());
        assert!(validate_positive(-5.0, "Quantity").is_err());
        assert!(validate_positive(f64::INFINITY, "Quantity").is_err());
    }
}

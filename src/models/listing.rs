// SPDX-License-Identifier: MIT

//! Crop listing model for storage and API.

use serde::{Deserialize, Serialize};

/// Whether the listing offers to sell or asks to buy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingType {
    Sell,
    Buy,
}

impl ListingType {
    /// Stored field value, as serialized by serde.
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingType::Sell => "sell",
            ListingType::Buy => "buy",
        }
    }
}

/// Listing lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Active,
    Sold,
    Expired,
}

impl ListingStatus {
    /// Stored field value, as serialized by serde.
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Active => "active",
            ListingStatus::Sold => "sold",
            ListingStatus::Expired => "expired",
        }
    }
}

/// Location of the offered crop.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingLocation {
    pub state: Option<String>,
    pub district: Option<String>,
}

/// A buy or sell offer stored in Firestore.
///
/// Invariant: only the owning seller may mutate or delete a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    /// Document ID (UUID v4)
    pub id: String,
    /// Owning user ID
    pub seller_id: String,
    #[serde(rename = "type")]
    pub listing_type: ListingType,
    pub crop_name: String,
    pub quantity: f64,
    pub unit: String,
    pub price_per_unit: f64,
    #[serde(default)]
    pub images: Vec<String>,
    pub description: Option<String>,
    pub location: Option<ListingLocation>,
    pub status: ListingStatus,
    /// Expiry date (RFC3339)
    pub expiry_date: Option<String>,
    /// Soft view counter, incremented on every fetch-by-id
    #[serde(default)]
    pub views: u64,
    pub created_at: String,
    pub updated_at: String,
}

impl Listing {
    /// Revenue a sold listing realized; zero for anything not sold.
    pub fn sold_revenue(&self) -> f64 {
        if self.status == ListingStatus::Sold {
            self.quantity * self.price_per_unit
        } else {
            0.0
        }
    }
}

/// Partial update for a listing.
///
/// Each field is independently optional: `None` means "absent from the
/// request, preserve the stored value". This keeps the merge explicit
/// rather than relying on falsy coalescing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingPatch {
    pub crop_name: Option<String>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub price_per_unit: Option<f64>,
    pub images: Option<Vec<String>>,
    pub description: Option<String>,
    pub location: Option<ListingLocation>,
    pub status: Option<ListingStatus>,
    pub expiry_date: Option<String>,
}

impl ListingPatch {
    /// Apply the supplied fields onto an existing listing.
    pub fn apply(&self, listing: &mut Listing) {
        if let Some(crop_name) = &self.crop_name {
            listing.crop_name = crop_name.clone();
        }
        if let Some(quantity) = self.quantity {
            listing.quantity = quantity;
        }
        if let Some(unit) = &self.unit {
            listing.unit = unit.clone();
        }
        if let Some(price) = self.price_per_unit {
            listing.price_per_unit = price;
        }
        if let Some(images) = &self.images {
            listing.images = images.clone();
        }
        if let Some(description) = &self.description {
            listing.description = Some(description.clone());
        }
        if let Some(location) = &self.location {
            listing.location = Some(location.clone());
        }
        if let Some(status) = self.status {
            listing.status = status;
        }
        if let Some(expiry) = &self.expiry_date {
            listing.expiry_date = Some(expiry.clone());
        }
    }
}

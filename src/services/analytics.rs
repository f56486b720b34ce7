// SPDX-License-Identifier: MIT

//! Listing analytics aggregation.
//!
//! Pure functions over a user's listings: the cached profile stats
//! refresh and the period-scoped analytics report. Handlers fetch the
//! listings once and feed them through here.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde_json::json;

use crate::models::{Listing, ListingStatus, ProfileStats};

/// Analytics time window. Parsed from the `period` query parameter,
/// defaulting to 30 days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Days7,
    Days30,
    Days90,
    Year1,
}

impl Period {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("7d") => Period::Days7,
            Some("90d") => Period::Days90,
            Some("1y") => Period::Year1,
            _ => Period::Days30,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Days7 => "7d",
            Period::Days30 => "30d",
            Period::Days90 => "90d",
            Period::Year1 => "1y",
        }
    }

    /// Earliest timestamp included in the window, relative to `now`.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let days = match self {
            Period::Days7 => 7,
            Period::Days30 => 30,
            Period::Days90 => 90,
            Period::Year1 => 365,
        };
        now - Duration::days(days)
    }
}

/// Recompute cached listing stats from the full listing set.
///
/// Rating fields and profile views are maintained elsewhere and are
/// left untouched.
pub fn refresh_stats(stats: &mut ProfileStats, listings: &[Listing]) {
    let mut total = 0u32;
    let mut active = 0u32;
    let mut sold = 0u32;
    let mut revenue = 0.0f64;
    let mut quantity_sold = 0.0f64;

    for listing in listings {
        total += 1;
        match listing.status {
            ListingStatus::Active => active += 1,
            ListingStatus::Sold => {
                sold += 1;
                revenue += listing.quantity * listing.price_per_unit;
                quantity_sold += listing.quantity;
            }
            ListingStatus::Expired => {}
        }
    }

    stats.total_listings = total;
    stats.active_listings = active;
    stats.sold_listings = sold;
    stats.total_revenue = revenue;
    stats.total_quantity_sold = quantity_sold;
}

/// Build the analytics report for a user's listings.
///
/// `listings_over_time` buckets listings created within the window by
/// calendar day; `crop_distribution` counts across all listings
/// regardless of window, capped to the top 10 crops.
pub fn build_analytics(
    listings: &[Listing],
    period: Period,
    now: DateTime<Utc>,
) -> serde_json::Value {
    let cutoff = period.cutoff(now);

    let total = listings.len();
    let active = listings
        .iter()
        .filter(|l| l.status == ListingStatus::Active)
        .count();
    let sold = listings
        .iter()
        .filter(|l| l.status == ListingStatus::Sold)
        .count();
    let revenue: f64 = listings.iter().map(|l| l.sold_revenue()).sum();

    let average_listing_price = if sold > 0 {
        (revenue / sold as f64).round()
    } else {
        0.0
    };
    let conversion_rate = if total > 0 {
        format!("{:.2}", sold as f64 / total as f64 * 100.0)
    } else {
        "0.00".to_string()
    };

    // Per-day creation buckets within the window. Timestamps are RFC3339
    // so the first 10 chars are the calendar date.
    let mut day_buckets: HashMap<String, DayBucket> = HashMap::new();
    for listing in listings {
        if let Ok(created) = DateTime::parse_from_rfc3339(&listing.created_at) {
            if created.with_timezone(&Utc) >= cutoff && listing.created_at.len() >= 10 {
                let bucket = day_buckets
                    .entry(listing.created_at[..10].to_string())
                    .or_default();
                bucket.count += 1;
                bucket.revenue += listing.sold_revenue();
            }
        }
    }
    let mut listings_over_time: Vec<(String, DayBucket)> = day_buckets.into_iter().collect();
    listings_over_time.sort_by(|a, b| a.0.cmp(&b.0));
    let listings_over_time: Vec<_> = listings_over_time
        .into_iter()
        .map(|(date, bucket)| {
            json!({ "date": date, "count": bucket.count, "revenue": bucket.revenue })
        })
        .collect();

    let mut crop_stats: HashMap<&str, CropStats> = HashMap::new();
    for listing in listings {
        let entry = crop_stats.entry(listing.crop_name.as_str()).or_default();
        entry.count += 1;
        entry.quantity += listing.quantity;
        entry.revenue += listing.sold_revenue();
    }
    let mut crop_distribution: Vec<(&str, CropStats)> = crop_stats.into_iter().collect();
    crop_distribution.sort_by(|a, b| b.1.count.cmp(&a.1.count).then(a.0.cmp(b.0)));
    crop_distribution.truncate(10);

    let top_performing_crops: Vec<_> = crop_distribution
        .iter()
        .take(5)
        .map(|(crop, stats)| {
            json!({ "crop": crop, "listings": stats.count, "revenue": stats.revenue })
        })
        .collect();

    let crop_distribution: Vec<_> = crop_distribution
        .into_iter()
        .map(|(crop, stats)| {
            json!({
                "crop": crop,
                "count": stats.count,
                "quantity": stats.quantity,
                "revenue": stats.revenue,
            })
        })
        .collect();

    json!({
        "period": period.as_str(),
        "summary": {
            "total_listings": total,
            "active_listings": active,
            "sold_listings": sold,
            "total_revenue": revenue,
            "average_listing_price": average_listing_price,
            "conversion_rate": conversion_rate,
        },
        "listings_over_time": listings_over_time,
        "crop_distribution": crop_distribution,
        "top_performing_crops": top_performing_crops,
    })
}

#[derive(Default)]
struct DayBucket {
    count: u32,
    revenue: f64,
}

#[derive(Default)]
struct CropStats {
    count: u32,
    quantity: f64,
    revenue: f64,
}

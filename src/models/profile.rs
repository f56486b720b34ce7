//! Extended user profile aggregate.
//!
//! One-to-one with `User`, created lazily on first profile access.
//! Holds farm/business details, KYC documents, bank details, cached
//! listing stats, a bounded activity log, preferences, and achievements.

use serde::{Deserialize, Serialize};

use crate::models::user::{User, UserRole};
use crate::time_utils::now_rfc3339;

/// Maximum number of activity log entries retained (newest first).
pub const MAX_RECENT_ACTIVITIES: usize = 50;

/// Completion weights per category. Each category is binary: fully
/// satisfied or not. The sum is capped at 100.
const WEIGHT_BASIC_INFO: u8 = 20;
const WEIGHT_LOCATION: u8 = 10;
const WEIGHT_SOIL_HEALTH: u8 = 15;
const WEIGHT_FARM_DETAILS: u8 = 20;
const WEIGHT_BANK_DETAILS: u8 = 15;
const WEIGHT_KYC: u8 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LandUnit {
    Acre,
    Hectare,
    Bigha,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IrrigationType {
    Rainfed,
    Canal,
    Well,
    Drip,
    Sprinkler,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FarmingType {
    Organic,
    Conventional,
    Mixed,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FarmLocation {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
}

/// Farm details (for farmers).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FarmDetails {
    pub farm_name: Option<String>,
    pub total_land_area: Option<f64>,
    pub land_unit: LandUnit,
    pub irrigation_type: Option<IrrigationType>,
    #[serde(default)]
    pub primary_crops: Vec<String>,
    pub farming_type: Option<FarmingType>,
    pub farm_location: Option<FarmLocation>,
}

impl Default for FarmDetails {
    fn default() -> Self {
        Self {
            farm_name: None,
            total_land_area: None,
            land_unit: LandUnit::Acre,
            irrigation_type: None,
            primary_crops: Vec::new(),
            farming_type: None,
            farm_location: None,
        }
    }
}

/// Business details (for buyers).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BusinessDetails {
    pub business_name: Option<String>,
    pub gst_number: Option<String>,
    pub business_type: Option<String>,
    pub purchase_volume: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Aadhaar,
    KisanCreditCard,
    LandRecord,
    BankPassbook,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Pending,
    Verified,
    Rejected,
}

/// An uploaded KYC document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KycDocument {
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    pub document_name: String,
    pub document_url: String,
    pub verification_status: VerificationStatus,
    pub uploaded_at: String,
    pub verified_at: Option<String>,
    pub rejection_reason: Option<String>,
}

/// Overall KYC state of the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KycStatus {
    NotStarted,
    Pending,
    Verified,
    Rejected,
}

/// Bank account details. The account number is masked on every read
/// path via [`BankDetails::masked`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BankDetails {
    pub account_holder_name: Option<String>,
    pub account_number: Option<String>,
    pub ifsc_code: Option<String>,
    pub bank_name: Option<String>,
    pub branch: Option<String>,
    #[serde(default)]
    pub is_verified: bool,
}

impl BankDetails {
    /// Copy with the account number reduced to `XXXX` + last 4 digits.
    pub fn masked(&self) -> BankDetails {
        let mut masked = self.clone();
        masked.account_number = self.account_number.as_ref().map(|n| {
            let tail: String = n
                .chars()
                .rev()
                .take(4)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            format!("XXXX{}", tail)
        });
        masked
    }
}

/// Validate an IFSC code: four uppercase letters, a literal '0', then
/// six uppercase alphanumerics.
pub fn is_valid_ifsc(code: &str) -> bool {
    let bytes = code.as_bytes();
    bytes.len() == 11
        && bytes[..4].iter().all(|b| b.is_ascii_uppercase())
        && bytes[4] == b'0'
        && bytes[5..]
            .iter()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

/// A single entry in the bounded activity log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub action: String,
    pub description: String,
    pub metadata: Option<serde_json::Value>,
    pub timestamp: String,
}

/// Notification preference flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPreferences {
    pub email: bool,
    pub sms: bool,
    pub push: bool,
    pub marketing_emails: bool,
    pub price_alerts: bool,
    pub new_messages: bool,
    pub listing_updates: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            email: true,
            sms: true,
            push: true,
            marketing_emails: false,
            price_alerts: true,
            new_messages: true,
            listing_updates: true,
        }
    }
}

/// User settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preferences {
    pub language: String,
    pub currency: String,
    pub timezone: String,
    #[serde(default)]
    pub notifications: NotificationPreferences,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            language: "hi".to_string(),
            currency: "INR".to_string(),
            timezone: "Asia/Kolkata".to_string(),
            notifications: NotificationPreferences::default(),
        }
    }
}

/// Cached listing statistics, refreshed from the listings collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileStats {
    #[serde(default)]
    pub total_listings: u32,
    #[serde(default)]
    pub active_listings: u32,
    #[serde(default)]
    pub sold_listings: u32,
    #[serde(default)]
    pub total_revenue: f64,
    #[serde(default)]
    pub total_quantity_sold: f64,
    #[serde(default)]
    pub average_rating: f64,
    #[serde(default)]
    pub total_reviews: u32,
    #[serde(default)]
    pub profile_views: u64,
    #[serde(default)]
    pub last_active_at: String,
}

/// A badge earned by the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Achievement {
    pub name: String,
    pub earned_at: String,
    pub description: Option<String>,
}

/// Extended profile aggregate, keyed by the owning user's ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    /// Derived completion percentage (0-100); never user-set
    #[serde(default)]
    pub profile_completion: u8,
    pub farm_details: Option<FarmDetails>,
    pub business_details: Option<BusinessDetails>,
    #[serde(default)]
    pub documents: Vec<KycDocument>,
    pub kyc_status: KycStatus,
    pub kyc_verified_at: Option<String>,
    pub bank_details: Option<BankDetails>,
    #[serde(default)]
    pub stats: ProfileStats,
    /// Bounded activity log, newest first
    #[serde(default)]
    pub recent_activities: Vec<ActivityEntry>,
    #[serde(default)]
    pub preferences: Preferences,
    #[serde(default)]
    pub badges: Vec<String>,
    #[serde(default)]
    pub achievements: Vec<Achievement>,
    pub created_at: String,
    pub updated_at: String,
}

impl UserProfile {
    /// Fresh profile for a user, created lazily on first access.
    pub fn new(user_id: &str) -> Self {
        let now = now_rfc3339();
        Self {
            user_id: user_id.to_string(),
            profile_completion: 0,
            farm_details: None,
            business_details: None,
            documents: Vec::new(),
            kyc_status: KycStatus::NotStarted,
            kyc_verified_at: None,
            bank_details: None,
            stats: ProfileStats {
                last_active_at: now.clone(),
                ..Default::default()
            },
            recent_activities: Vec::new(),
            preferences: Preferences::default(),
            badges: Vec::new(),
            achievements: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Prepend an activity entry, dropping the oldest beyond the cap.
    pub fn add_activity(
        &mut self,
        action: &str,
        description: &str,
        metadata: Option<serde_json::Value>,
    ) {
        self.recent_activities.insert(
            0,
            ActivityEntry {
                action: action.to_string(),
                description: description.to_string(),
                metadata,
                timestamp: now_rfc3339(),
            },
        );

        self.recent_activities.truncate(MAX_RECENT_ACTIVITIES);
    }

    /// Recompute the weighted completion percentage and store it.
    ///
    /// Six binary categories: basic info 20, location 10, soil health 15,
    /// farm details 20 (granted outright to buyers), bank details 15
    /// (requires verification), KYC 20. Capped at 100.
    pub fn recalculate_completion(&mut self, user: &User) -> u8 {
        let mut completion: u32 = 0;

        // Basic info: name, email, phone
        if !user.name.is_empty() && !user.email.is_empty() && user.phone.is_some() {
            completion += WEIGHT_BASIC_INFO as u32;
        }

        // Location: state and district
        if let Some(location) = &user.location {
            if location.state.is_some() && location.district.is_some() {
                completion += WEIGHT_LOCATION as u32;
            }
        }

        // Soil health card: all four readings present
        if user.soil_health_card.is_complete() {
            completion += WEIGHT_SOIL_HEALTH as u32;
        }

        // Farm details: farmers need name, land area, and crops; buyers
        // get the category outright.
        match user.role {
            UserRole::Farmer => {
                if let Some(farm) = &self.farm_details {
                    if farm.farm_name.is_some()
                        && farm.total_land_area.is_some()
                        && !farm.primary_crops.is_empty()
                    {
                        completion += WEIGHT_FARM_DETAILS as u32;
                    }
                }
            }
            UserRole::Buyer => completion += WEIGHT_FARM_DETAILS as u32,
            UserRole::Admin => {}
        }

        // Bank details: account number + IFSC, and verified
        if let Some(bank) = &self.bank_details {
            if bank.account_number.is_some() && bank.ifsc_code.is_some() && bank.is_verified {
                completion += WEIGHT_BANK_DETAILS as u32;
            }
        }

        // KYC
        if self.kyc_status == KycStatus::Verified {
            completion += WEIGHT_KYC as u32;
        }

        self.profile_completion = completion.min(100) as u8;
        self.profile_completion
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::SoilHealthCard;

    fn make_user(role: UserRole) -> User {
        User {
            id: "u1".to_string(),
            name: "Devansh".to_string(),
            email: "devansh@example.com".to_string(),
            phone: Some("9876543210".to_string()),
            password_hash: "hash".to_string(),
            role,
            language: "hi".to_string(),
            location: Some(crate::models::user::UserLocation {
                state: Some("Punjab".to_string()),
                district: Some("Ludhiana".to_string()),
                pincode: None,
            }),
            soil_health_card: SoilHealthCard::empty(),
            is_verified: false,
            created_at: "2025-01-01T00:00:00Z".to_string(),
            updated_at: "2025-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_completion_basic_and_location_only() {
        let user = make_user(UserRole::Farmer);
        let mut profile = UserProfile::new(&user.id);

        // basic 20 + location 10
        assert_eq!(profile.recalculate_completion(&user), 30);
    }

    #[test]
    fn test_completion_buyer_gets_farm_category() {
        let user = make_user(UserRole::Buyer);
        let mut profile = UserProfile::new(&user.id);

        // basic 20 + location 10 + farm 20 (buyers exempt)
        assert_eq!(profile.recalculate_completion(&user), 50);
    }

    #[test]
    fn test_completion_full_farmer_profile() {
        let mut user = make_user(UserRole::Farmer);
        user.soil_health_card = SoilHealthCard {
            nitrogen: Some(120.0),
            phosphorus: Some(40.0),
            potassium: Some(60.0),
            ph: Some(6.8),
            last_updated: Some("2025-01-01T00:00:00Z".to_string()),
        };

        let mut profile = UserProfile::new(&user.id);
        profile.farm_details = Some(FarmDetails {
            farm_name: Some("Green Acres".to_string()),
            total_land_area: Some(5.0),
            primary_crops: vec!["wheat".to_string()],
            ..Default::default()
        });
        profile.bank_details = Some(BankDetails {
            account_number: Some("123456789012".to_string()),
            ifsc_code: Some("HDFC0001234".to_string()),
            is_verified: true,
            ..Default::default()
        });
        profile.kyc_status = KycStatus::Verified;

        assert_eq!(profile.recalculate_completion(&user), 100);
    }

    #[test]
    fn test_completion_unverified_bank_does_not_count() {
        let user = make_user(UserRole::Farmer);
        let mut profile = UserProfile::new(&user.id);
        profile.bank_details = Some(BankDetails {
            account_number: Some("123456789012".to_string()),
            ifsc_code: Some("HDFC0001234".to_string()),
            is_verified: false,
            ..Default::default()
        });

        assert_eq!(profile.recalculate_completion(&user), 30);
    }

    #[test]
    fn test_activity_log_capped_at_50() {
        let mut profile = UserProfile::new("u1");

        for i in 0..60 {
            profile.add_activity("test", &format!("entry {}", i), None);
        }

        assert_eq!(profile.recent_activities.len(), MAX_RECENT_ACTIVITIES);
        // Newest first: the last entry added is at the front
        assert_eq!(profile.recent_activities[0].description, "entry 59");
        // Oldest retained is entry 10 (0..=9 were dropped)
        assert_eq!(profile.recent_activities[49].description, "entry 10");
    }

    #[test]
    fn test_ifsc_validation() {
        assert!(is_valid_ifsc("HDFC0001234"));
        assert!(is_valid_ifsc("SBIN0ABC123"));

        assert!(!is_valid_ifsc("hdfc0001234")); // lowercase
        assert!(!is_valid_ifsc("HDFC1001234")); // missing required '0'
        assert!(!is_valid_ifsc("HDFC000123")); // too short
        assert!(!is_valid_ifsc("HDFC00012345")); // too long
    }

    #[test]
    fn test_bank_details_masking() {
        let bank = BankDetails {
            account_number: Some("123456789012".to_string()),
            ..Default::default()
        };

        let masked = bank.masked();
        assert_eq!(masked.account_number.as_deref(), Some("XXXX9012"));

        let empty = BankDetails::default().masked();
        assert_eq!(empty.account_number, None);
    }
}

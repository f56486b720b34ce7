//! User model for storage and API.

use serde::{Deserialize, Serialize};

/// User role on the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Farmer,
    Buyer,
    Admin,
}

/// Postal location of a user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserLocation {
    pub state: Option<String>,
    pub district: Option<String>,
    pub pincode: Option<String>,
}

/// Soil health snapshot, owned entirely by its parent user record.
///
/// All fields are nullable; an empty card means no data has been
/// submitted yet. Updates replace the whole record, not individual
/// fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SoilHealthCard {
    pub nitrogen: Option<f64>,
    pub phosphorus: Option<f64>,
    pub potassium: Option<f64>,
    pub ph: Option<f64>,
    /// When the card was last replaced (RFC3339)
    pub last_updated: Option<String>,
}

impl SoilHealthCard {
    /// An empty card with no readings.
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when all four readings are present.
    pub fn is_complete(&self) -> bool {
        self.nitrogen.is_some()
            && self.phosphorus.is_some()
            && self.potassium.is_some()
            && self.ph.is_some()
    }
}

/// User view returned by the API. Excludes the password hash, which
/// only exists in the stored record.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub language: String,
    pub location: Option<UserLocation>,
    pub soil_health_card: SoilHealthCard,
    pub is_verified: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            role: user.role,
            language: user.language.clone(),
            location: user.location.clone(),
            soil_health_card: user.soil_health_card.clone(),
            is_verified: user.is_verified,
            created_at: user.created_at.clone(),
            updated_at: user.updated_at.clone(),
        }
    }
}

/// User record stored in Firestore.
///
/// Invariant: `email` is lowercased and unique across all users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Document ID (UUID v4)
    pub id: String,
    pub name: String,
    /// Unique, lowercased email address
    pub email: String,
    pub phone: Option<String>,
    /// bcrypt password hash; never serialized into API responses
    pub password_hash: String,
    pub role: UserRole,
    /// Preferred language ("hi" by default)
    pub language: String,
    pub location: Option<UserLocation>,
    #[serde(default)]
    pub soil_health_card: SoilHealthCard,
    #[serde(default)]
    pub is_verified: bool,
    /// Created timestamp (RFC3339)
    pub created_at: String,
    /// Updated timestamp (RFC3339)
    pub updated_at: String,
}

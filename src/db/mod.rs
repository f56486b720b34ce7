//! Database layer (Firestore).

pub mod firestore;

pub use firestore::{FirestoreDb, ListingQuery};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const LISTINGS: &str = "listings";
    /// Extended profile aggregates (keyed by user id)
    pub const USER_PROFILES: &str = "user_profiles";
    pub const CHAT_HISTORIES: &str = "chat_histories";
}

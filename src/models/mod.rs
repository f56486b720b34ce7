// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod chat;
pub mod listing;
pub mod profile;
pub mod user;

pub use chat::{ChatHistory, ChatMessage, ChatMetadata, MessageRole};
pub use listing::{Listing, ListingLocation, ListingPatch, ListingStatus, ListingType};
pub use profile::{ProfileStats, UserProfile};
pub use user::{PublicUser, SoilHealthCard, User, UserLocation, UserRole};

// SPDX-License-Identifier: MIT

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (accounts + soil health)
//! - Listings (crop buy/sell offers)
//! - User profiles (extended aggregate)
//! - Chat histories (conversation threads)
//!
//! Ownership-gated mutations run inside a Firestore transaction so the
//! owner check and the write commit together, closing the
//! check-then-act window a plain fetch-then-compare would leave open.

use crate::db::collections;
use crate::error::AppError;
use crate::models::{ChatHistory, Listing, ListingPatch, User, UserProfile};
use crate::time_utils::now_rfc3339;

/// Filters for listing queries. `None` fields are not applied.
#[derive(Debug, Clone, Default)]
pub struct ListingQuery {
    pub seller_id: Option<String>,
    /// Serialized listing type ("sell" / "buy")
    pub listing_type: Option<String>,
    /// Serialized status ("active" / "sold" / "expired")
    pub status: Option<String>,
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by ID.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a user by lowercased email (unique).
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let email = email.to_lowercase();
        let users: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.field("email").eq(email.clone()))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(users.into_iter().next())
    }

    /// Create or update a user.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Listing Operations ──────────────────────────────────────

    /// Get a listing by ID.
    pub async fn get_listing(&self, listing_id: &str) -> Result<Option<Listing>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::LISTINGS)
            .obj()
            .one(listing_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or replace a listing document.
    pub async fn upsert_listing(&self, listing: &Listing) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::LISTINGS)
            .document_id(&listing.id)
            .object(listing)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Query listings with optional equality filters, newest first.
    ///
    /// Substring matching on crop names and pagination happen in memory
    /// at the call site; per-user and per-filter result sets stay small.
    pub async fn query_listings(&self, filter: &ListingQuery) -> Result<Vec<Listing>, AppError> {
        let seller_id = filter.seller_id.clone();
        let listing_type = filter.listing_type.clone();
        let status = filter.status.clone();

        self.get_client()?
            .fluent()
            .select()
            .from(collections::LISTINGS)
            .filter(move |q| {
                let mut conditions = Vec::new();
                if let Some(seller_id) = &seller_id {
                    conditions.push(q.field("seller_id").eq(seller_id.clone()));
                }
                if let Some(listing_type) = &listing_type {
                    conditions.push(q.field("type").eq(listing_type.clone()));
                }
                if let Some(status) = &status {
                    conditions.push(q.field("status").eq(status.clone()));
                }
                q.for_all(conditions)
            })
            .order_by([(
                "created_at",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Apply a patch to a listing, but only when `caller_id` owns it.
    ///
    /// Runs as a transaction: the read registers the document for
    /// conflict detection and the write commits atomically with it.
    pub async fn update_listing_owned(
        &self,
        listing_id: &str,
        caller_id: &str,
        patch: &ListingPatch,
    ) -> Result<Listing, AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let current: Option<Listing> = client
            .fluent()
            .select()
            .by_id_in(collections::LISTINGS)
            .obj()
            .one(listing_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut listing = match current {
            Some(listing) => listing,
            None => {
                let _ = transaction.rollback().await;
                return Err(AppError::NotFound("Listing not found".to_string()));
            }
        };

        if listing.seller_id != caller_id {
            let _ = transaction.rollback().await;
            return Err(AppError::Forbidden("Not allowed".to_string()));
        }

        patch.apply(&mut listing);
        listing.updated_at = now_rfc3339();

        client
            .fluent()
            .update()
            .in_col(collections::LISTINGS)
            .document_id(listing_id)
            .object(&listing)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add listing to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        Ok(listing)
    }

    /// Delete a listing, but only when `caller_id` owns it.
    pub async fn delete_listing_owned(
        &self,
        listing_id: &str,
        caller_id: &str,
    ) -> Result<(), AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let current: Option<Listing> = client
            .fluent()
            .select()
            .by_id_in(collections::LISTINGS)
            .obj()
            .one(listing_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let listing = match current {
            Some(listing) => listing,
            None => {
                let _ = transaction.rollback().await;
                return Err(AppError::NotFound("Listing not found".to_string()));
            }
        };

        if listing.seller_id != caller_id {
            let _ = transaction.rollback().await;
            return Err(AppError::Forbidden("Not allowed".to_string()));
        }

        client
            .fluent()
            .delete()
            .from(collections::LISTINGS)
            .document_id(listing_id)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add deletion to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        Ok(())
    }

    // ─── Profile Operations ──────────────────────────────────────

    /// Get the extended profile for a user.
    pub async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USER_PROFILES)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store the extended profile, keyed by user id.
    pub async fn set_profile(&self, profile: &UserProfile) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USER_PROFILES)
            .document_id(&profile.user_id)
            .object(profile)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Chat History Operations ─────────────────────────────────

    /// Get a conversation by ID.
    pub async fn get_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<Option<ChatHistory>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::CHAT_HISTORIES)
            .obj()
            .one(conversation_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or replace a conversation document.
    pub async fn upsert_conversation(&self, conversation: &ChatHistory) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::CHAT_HISTORIES)
            .document_id(&conversation.id)
            .object(conversation)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// All conversations for a user, most recently updated first.
    pub async fn query_conversations(&self, user_id: &str) -> Result<Vec<ChatHistory>, AppError> {
        let user_id = user_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::CHAT_HISTORIES)
            .filter(move |q| q.field("user_id").eq(user_id.clone()))
            .order_by([(
                "updated_at",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a conversation, but only when `caller_id` owns it.
    ///
    /// A missing or foreign conversation is reported as not-found rather
    /// than forbidden, so callers cannot probe other users' thread IDs.
    pub async fn delete_conversation_owned(
        &self,
        conversation_id: &str,
        caller_id: &str,
    ) -> Result<(), AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let current: Option<ChatHistory> = client
            .fluent()
            .select()
            .by_id_in(collections::CHAT_HISTORIES)
            .obj()
            .one(conversation_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        match current {
            Some(conversation) if conversation.user_id == caller_id => {}
            _ => {
                let _ = transaction.rollback().await;
                return Err(AppError::NotFound("Conversation not found".to_string()));
            }
        }

        client
            .fluent()
            .delete()
            .from(collections::CHAT_HISTORIES)
            .document_id(conversation_id)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add deletion to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        Ok(())
    }
}

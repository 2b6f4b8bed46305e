//! Session management over the key/value store
//!
//! One active refresh token per user. A refresh token is only honoured while
//! it is the one recorded for the user's session.

use anyhow::Result;
use common::cache::KeyValueStore;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Session manager for handling user sessions
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn KeyValueStore>,
    ttl_seconds: u64,
}

fn session_key(user_id: Uuid) -> String {
    format!("session:{}", user_id)
}

impl SessionManager {
    /// Create a new session manager; sessions live as long as refresh tokens
    pub fn new(store: Arc<dyn KeyValueStore>, ttl_seconds: u64) -> Self {
        Self { store, ttl_seconds }
    }

    /// Record the user's current refresh token, replacing any previous one
    pub async fn store_session(&self, user_id: Uuid, refresh_token: &str) -> Result<()> {
        info!("Storing session for user: {}", user_id);
        self.store
            .set(&session_key(user_id), refresh_token, Some(self.ttl_seconds))
            .await
    }

    /// Delete a session for a user
    pub async fn delete_session(&self, user_id: Uuid) -> Result<()> {
        info!("Deleting session for user: {}", user_id);
        self.store.delete(&session_key(user_id)).await
    }

    /// Check if the refresh token is the user's active one
    pub async fn is_session_valid(&self, user_id: Uuid, refresh_token: &str) -> Result<bool> {
        let stored = self.store.get(&session_key(user_id)).await?;
        Ok(stored.as_deref() == Some(refresh_token))
    }

    /// Get store health status
    pub async fn health_check(&self) -> Result<bool> {
        self.store.health_check().await
    }
}

//! In-memory credential store for tests and embedders without durable
//! storage.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::CoreResult;
use crate::store::{CredentialStore, keys};
use crate::types::User;

/// A [`CredentialStore`] that keeps its entries in process memory.
///
/// Nothing survives a restart, which makes it the right backend for tests
/// and for the mock variant of the dashboard.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a raw entry under an arbitrary key.
    pub async fn set_item(&self, key: &str, value: &str) {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
    }

    /// Read a raw entry.
    pub async fn item(&self, key: &str) -> Option<String> {
        self.entries.read().await.get(key).cloned()
    }

    /// Remove a raw entry. Removing an absent key is a no-op.
    pub async fn remove_item(&self, key: &str) {
        self.entries.write().await.remove(key);
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn set_auth_token(&self, token: &str) -> CoreResult<()> {
        self.set_item(keys::AUTH_TOKEN, token).await;
        Ok(())
    }

    async fn auth_token(&self) -> CoreResult<Option<String>> {
        Ok(self.item(keys::AUTH_TOKEN).await)
    }

    async fn set_refresh_token(&self, token: &str) -> CoreResult<()> {
        self.set_item(keys::REFRESH_TOKEN, token).await;
        Ok(())
    }

    async fn refresh_token(&self) -> CoreResult<Option<String>> {
        Ok(self.item(keys::REFRESH_TOKEN).await)
    }

    async fn set_user_data(&self, user: &User) -> CoreResult<()> {
        let serialized = serde_json::to_string(user)?;
        self.set_item(keys::USER, &serialized).await;
        Ok(())
    }

    async fn user_data(&self) -> CoreResult<Option<User>> {
        let Some(raw) = self.item(keys::USER).await else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(err) => {
                tracing::warn!("discarding unparsable stored user record: {err}");
                Ok(None)
            }
        }
    }

    async fn set_last_login(&self) -> CoreResult<()> {
        self.set_item(keys::LAST_LOGIN, &Utc::now().to_rfc3339()).await;
        Ok(())
    }

    async fn last_login(&self) -> CoreResult<Option<DateTime<Utc>>> {
        let Some(raw) = self.item(keys::LAST_LOGIN).await else {
            return Ok(None);
        };

        match DateTime::parse_from_rfc3339(&raw) {
            Ok(stamp) => Ok(Some(stamp.with_timezone(&Utc))),
            Err(err) => {
                tracing::warn!("discarding unparsable last-login stamp: {err}");
                Ok(None)
            }
        }
    }

    async fn clear_auth_data(&self) -> CoreResult<()> {
        let mut entries = self.entries.write().await;
        entries.remove(keys::AUTH_TOKEN);
        entries.remove(keys::REFRESH_TOKEN);
        entries.remove(keys::USER);
        entries.remove(keys::LAST_LOGIN);
        Ok(())
    }
}

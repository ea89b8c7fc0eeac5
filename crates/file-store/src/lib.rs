//! File-backed credential store.
//!
//! Persists the session's credential fields as a single JSON document on
//! disk, the desktop analog of the browser profile's localStorage namespace.
//! Writes go to a temporary file and are moved into place, so a crash
//! mid-write leaves either the old document or the new one, never a torn
//! file. An unreadable or corrupt document degrades to "no stored
//! credentials"; it never surfaces as a crash.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use incentive_core::store::keys;
use incentive_core::{CoreError, CoreResult, CredentialStore, User};
use tokio::sync::Mutex;

/// A [`CredentialStore`] backed by a JSON file.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    // Serializes read-modify-write cycles against the backing file.
    write_lock: Mutex<()>,
}

impl FileCredentialStore {
    /// Create a store backed by the given file. The file and its parent
    /// directories are created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Create a store at the platform's per-user data directory.
    pub fn open_default() -> CoreResult<Self> {
        Ok(Self::new(Self::default_path()?))
    }

    /// The default credential file location for this platform.
    pub fn default_path() -> CoreResult<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", "incentive-admin")
            .ok_or_else(|| CoreError::storage("no home directory available"))?;
        Ok(dirs.data_dir().join("credentials.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Store a raw entry under an arbitrary key.
    pub async fn set_item(&self, key: &str, value: &str) -> CoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await;
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries).await
    }

    /// Read a raw entry.
    pub async fn item(&self, key: &str) -> Option<String> {
        self.load().await.get(key).cloned()
    }

    /// Remove a raw entry. Removing an absent key is a no-op.
    pub async fn remove_item(&self, key: &str) -> CoreResult<()> {
        self.remove_keys(&[key]).await
    }

    async fn load(&self) -> HashMap<String, String> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return HashMap::new(),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), "failed to read credential file: {err}");
                return HashMap::new();
            }
        };

        match serde_json::from_slice(&raw) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    "discarding corrupt credential file: {err}"
                );
                HashMap::new()
            }
        }
    }

    async fn persist(&self, entries: &HashMap<String, String>) -> CoreResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let serialized = serde_json::to_vec_pretty(entries)?;
        let staging = self.path.with_extension("json.tmp");
        tokio::fs::write(&staging, &serialized).await?;
        tokio::fs::rename(&staging, &self.path).await?;
        Ok(())
    }

    async fn remove_keys(&self, removed: &[&str]) -> CoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await;
        let before = entries.len();
        for key in removed {
            entries.remove(*key);
        }
        if entries.len() == before {
            return Ok(());
        }
        self.persist(&entries).await
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn set_auth_token(&self, token: &str) -> CoreResult<()> {
        self.set_item(keys::AUTH_TOKEN, token).await
    }

    async fn auth_token(&self) -> CoreResult<Option<String>> {
        Ok(self.item(keys::AUTH_TOKEN).await)
    }

    async fn set_refresh_token(&self, token: &str) -> CoreResult<()> {
        self.set_item(keys::REFRESH_TOKEN, token).await
    }

    async fn refresh_token(&self) -> CoreResult<Option<String>> {
        Ok(self.item(keys::REFRESH_TOKEN).await)
    }

    async fn set_user_data(&self, user: &User) -> CoreResult<()> {
        let serialized = serde_json::to_string(user)?;
        self.set_item(keys::USER, &serialized).await
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
        self.set_item(keys::LAST_LOGIN, &Utc::now().to_rfc3339()).await
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
        self.remove_keys(&[
            keys::AUTH_TOKEN,
            keys::REFRESH_TOKEN,
            keys::USER,
            keys::LAST_LOGIN,
        ])
        .await
    }
}

//! Durable credential persistence.
//!
//! The [`CredentialStore`] is the durable twin of the in-memory session: four
//! logical fields written together on login/refresh success and removed
//! together on logout. There is no transactional guarantee across the fields;
//! a reader that finds a partial record must treat it as "not authenticated".

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::CoreResult;
use crate::types::User;

mod memory;

pub use memory::MemoryCredentialStore;

/// Storage keys for the persisted credential fields.
pub mod keys {
    pub const AUTH_TOKEN: &str = "incentive_token";
    pub const REFRESH_TOKEN: &str = "incentive_refreshToken";
    pub const USER: &str = "incentive_user";
    pub const LAST_LOGIN: &str = "incentive_lastLogin";
}

/// Key-value persistence for one session per device profile.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn set_auth_token(&self, token: &str) -> CoreResult<()>;
    async fn auth_token(&self) -> CoreResult<Option<String>>;

    async fn set_refresh_token(&self, token: &str) -> CoreResult<()>;
    async fn refresh_token(&self) -> CoreResult<Option<String>>;

    /// Persist the user record as JSON.
    async fn set_user_data(&self, user: &User) -> CoreResult<()>;

    /// Read back the persisted user record.
    ///
    /// A stored record that fails to deserialize is reported as absent, never
    /// as an error.
    async fn user_data(&self) -> CoreResult<Option<User>>;

    /// Stamp the current time as the last successful login or refresh.
    async fn set_last_login(&self) -> CoreResult<()>;
    async fn last_login(&self) -> CoreResult<Option<DateTime<Utc>>>;

    /// Remove all credential fields. Fields that are already absent are
    /// skipped, so clearing an empty store succeeds.
    async fn clear_auth_data(&self) -> CoreResult<()>;
}

// Mock implementation for downstream tests, behind the `tests` feature
#[cfg(feature = "tests")]
pub mod mock {
    use super::*;
    use mockall::mock;

    mock! {
        pub CredentialStore {}

        #[async_trait]
        impl CredentialStore for CredentialStore {
            async fn set_auth_token(&self, token: &str) -> CoreResult<()>;
            async fn auth_token(&self) -> CoreResult<Option<String>>;
            async fn set_refresh_token(&self, token: &str) -> CoreResult<()>;
            async fn refresh_token(&self) -> CoreResult<Option<String>>;
            async fn set_user_data(&self, user: &User) -> CoreResult<()>;
            async fn user_data(&self) -> CoreResult<Option<User>>;
            async fn set_last_login(&self) -> CoreResult<()>;
            async fn last_login(&self) -> CoreResult<Option<DateTime<Utc>>>;
            async fn clear_auth_data(&self) -> CoreResult<()>;
        }
    }
}

//! Session configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tuning for the session controller and refresh engine.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Base URL of the incentive admin API
    pub base_url: String,
    /// Tenant scoping header value, when the backend is multi-tenant
    #[serde(default)]
    pub tenant_id: Option<String>,
    /// Milliseconds between refresh engine ticks
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,
    /// Seconds before expiry at which a token is proactively refreshed
    #[serde(default = "default_expiry_buffer_seconds")]
    pub expiry_buffer_seconds: i64,
    /// Request timeout for login/refresh calls, in seconds
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

fn default_refresh_interval_ms() -> u64 {
    60_000
}

fn default_expiry_buffer_seconds() -> i64 {
    incentive_core::DEFAULT_EXPIRY_BUFFER_SECS
}

fn default_request_timeout_seconds() -> u64 {
    10
}

impl SessionConfig {
    /// Configuration with the standard intervals for the given backend.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            tenant_id: None,
            refresh_interval_ms: default_refresh_interval_ms(),
            expiry_buffer_seconds: default_expiry_buffer_seconds(),
            request_timeout_seconds: default_request_timeout_seconds(),
        }
    }

    pub(crate) fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub(crate) fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

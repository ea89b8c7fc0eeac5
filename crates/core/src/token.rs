//! Advisory bearer token inspection.
//!
//! Decodes the payload of a compact JWT without verifying its signature.
//! The result only decides whether to attempt a proactive refresh before the
//! backend would reject the token server-side; it is never an authorization
//! decision.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use serde::Deserialize;

use crate::error::{CoreError, CoreResult};

/// Seconds before actual expiry at which a token is proactively treated as
/// expired.
pub const DEFAULT_EXPIRY_BUFFER_SECS: i64 = 60;

/// Claims decoded from a bearer token payload.
#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
    /// Expiration time (seconds since the unix epoch)
    pub exp: i64,
    /// Remaining claims, carried through as-is
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Decode the claims of a compact JWT without validating its signature.
pub fn decode_claims(token: &str) -> CoreResult<Claims> {
    let mut parts = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(CoreError::invalid_token("not in compact JWT form"));
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| CoreError::invalid_token(format!("payload is not base64url: {e}")))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| CoreError::invalid_token(format!("payload is not a claims object: {e}")))
}

/// Whether `token` is expired, or will expire within `buffer_seconds`.
///
/// Fails safe: a token that cannot be decoded is reported as expired so the
/// caller re-authenticates instead of silently trusting it.
pub fn is_expired(token: &str, buffer_seconds: i64) -> bool {
    match decode_claims(token) {
        Ok(claims) => claims.exp < Utc::now().timestamp() + buffer_seconds,
        Err(err) => {
            tracing::debug!("treating undecodable token as expired: {err}");
            true
        }
    }
}

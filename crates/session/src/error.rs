//! Session error types

use incentive_core::CoreError;
use incentive_http::ClientError;
use thiserror::Error;

/// Errors surfaced by the session controller.
///
/// Expected outcomes are not errors: rejected credentials come back as
/// `Ok(false)` from login, and a failed background refresh manifests as a
/// forced logout event rather than an `Err`.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Talking to the backend failed (network error, timeout, or an
    /// unexpected server response)
    #[error("Transport error: {0}")]
    Transport(#[from] ClientError),

    /// The credential store failed
    #[error("Storage error: {0}")]
    Storage(#[from] CoreError),

    /// A refresh was requested but no stored credential pair exists
    #[error("No stored credential pair to refresh")]
    MissingCredentials,
}

//! Core types and contracts for the incentive admin auth SDK.
//!
//! This crate carries the pieces every other member builds on: the
//! authenticated [`User`] record, the [`CredentialStore`] persistence
//! contract with its storage keys, and the advisory token inspector in
//! [`token`].

pub mod error;
pub mod store;
pub mod token;
pub mod types;

pub use error::{CoreError, CoreResult};
pub use store::{CredentialStore, MemoryCredentialStore};
pub use token::{Claims, DEFAULT_EXPIRY_BUFFER_SECS, decode_claims, is_expired};
pub use types::User;

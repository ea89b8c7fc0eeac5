//! Session lifecycle for the incentive admin dashboard.
//!
//! The [`SessionController`] is the single source of truth for "is this user
//! logged in". It bootstraps from a [`CredentialStore`] at startup, exposes
//! `login`/`logout`, and keeps the bearer token fresh in the background
//! through a recurring refresh task. UI shells subscribe to
//! [`SessionEvent`]s to react to transitions (including background logouts)
//! without polling.
//!
//! [`CredentialStore`]: incentive_core::CredentialStore

pub mod config;
pub mod controller;
mod engine;
pub mod error;
pub mod events;

pub use config::SessionConfig;
pub use controller::{ActiveSession, SessionController};
pub use error::SessionError;
pub use events::{LogoutReason, Navigation, SessionEvent};

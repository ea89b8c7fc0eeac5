//! HTTP client for the incentive admin backend's auth endpoints.

pub mod client;
pub mod types;

pub use client::error::ClientError;
pub use client::{AuthClient, AuthClientBuilder};

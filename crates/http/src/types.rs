//! Wire types for the auth endpoints.

use serde::{Deserialize, Serialize};

/// Body of `POST /Auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub user_name: String,
    pub password: String,
}

/// Response of `POST /Auth/login`.
///
/// Everything beyond the token is optional on the wire; the session layer
/// fills in defaults for absent fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Bearer token. Some backend builds send it as `accessToken`.
    #[serde(alias = "accessToken")]
    pub token: String,
    pub refresh_token: Option<String>,
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub roles: Option<Vec<String>>,
}

/// Body of `POST /Auth/refresh-token`: the current pair, both required.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub token: String,
    pub refresh_token: String,
}

/// Response of `POST /Auth/refresh-token`: the replacement pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenResponse {
    #[serde(alias = "accessToken")]
    pub token: String,
    pub refresh_token: String,
}

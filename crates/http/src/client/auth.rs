//! Authentication API client methods

use super::{AuthClient, ClientError};
use crate::types::{LoginRequest, LoginResponse, RefreshTokenRequest, RefreshTokenResponse};

impl AuthClient {
    /// Exchange a username and password for a token pair.
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, ClientError> {
        let req = self
            .request(reqwest::Method::POST, "/Auth/login")
            .json(&request);
        self.execute(req).await
    }

    /// Exchange the current token pair for a fresh one.
    pub async fn refresh_token(
        &self,
        request: RefreshTokenRequest,
    ) -> Result<RefreshTokenResponse, ClientError> {
        let req = self
            .request(reqwest::Method::POST, "/Auth/refresh-token")
            .json(&request);
        self.execute(req).await
    }
}

//! Refresh-on-demand session handling.
//!
//! `SessionManager` guarantees an access token before authorized calls. When
//! the store is empty it makes exactly one `/auth/refresh` round trip using
//! the session cookie; a failed refresh leaves the store empty and reports
//! "no token", which callers treat as "log in again".
//!
//! Concurrent callers are not coalesced. Two callers that both find the
//! store empty each refresh, and whichever reply lands last is kept.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::models::Identity;

use super::token::{AccessToken, TokenResponse, TokenStore};

#[derive(Debug, Deserialize)]
struct LocalLoginResponse {
    token: TokenResponse,
}

#[derive(Debug, Deserialize)]
struct GoogleLoginResponse {
    authorization_url: String,
}

#[derive(Serialize)]
struct LocalLoginRequest<'a> {
    login_id: &'a str,
    password: &'a str,
}

/// Access-token lifecycle on top of an `ApiClient` and its cookie jar.
pub struct SessionManager {
    api: ApiClient,
    tokens: Arc<TokenStore>,
}

impl SessionManager {
    pub fn new(api: ApiClient, tokens: Arc<TokenStore>) -> Self {
        Self { api, tokens }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn token_store(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    /// Return the held token, or mint one from the session cookie.
    ///
    /// A held token is returned as-is, even if it has lapsed. `None` means
    /// the refresh failed for any reason and the store has been cleared.
    pub async fn ensure_access_token(&self) -> Option<AccessToken> {
        if let Some(token) = self.tokens.get() {
            return Some(token);
        }

        debug!("No access token held, refreshing from session cookie");
        let refreshed = self
            .api
            .post_for_json::<TokenResponse>("/auth/refresh", None)
            .await
            .and_then(AccessToken::try_from);

        match refreshed {
            Ok(token) => {
                self.tokens.set(token.clone());
                debug!(expires_in = ?token.expires_in(), "Access token refreshed");
                Some(token)
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed");
                self.tokens.clear();
                None
            }
        }
    }

    /// Fetch the signed-in user's profile.
    pub async fn fetch_identity(&self) -> Result<Identity, ApiError> {
        let token = self
            .ensure_access_token()
            .await
            .ok_or(ApiError::Unauthenticated)?;
        self.api
            .get_json("/users/me", &[], Some(token.as_str()))
            .await
    }

    /// Sign in with a local login ID and password.
    ///
    /// Blank input is rejected before anything is sent. Any server or
    /// transport failure clears the store and reads as bad credentials.
    pub async fn login_local(&self, login_id: &str, password: &str) -> Result<AccessToken, ApiError> {
        let login_id = login_id.trim();
        let password = password.trim();
        if login_id.is_empty() || password.is_empty() {
            return Err(ApiError::Validation(
                "Enter both a login ID and a password".to_string(),
            ));
        }

        let request = LocalLoginRequest { login_id, password };
        let result = self
            .api
            .post_json::<LocalLoginResponse, _>("/auth/login/local", &request, None)
            .await
            .and_then(|r| AccessToken::try_from(r.token));

        match result {
            Ok(token) => {
                self.tokens.set(token.clone());
                info!(login_id = %login_id, "Logged in with local ID");
                Ok(token)
            }
            Err(e) => {
                warn!(login_id = %login_id, error = %e, "Local login failed");
                self.tokens.clear();
                Err(ApiError::InvalidCredentials)
            }
        }
    }

    /// Ask the server where to send the user for Google sign-in.
    pub async fn google_login_url(&self) -> Result<String, ApiError> {
        let response: GoogleLoginResponse = self
            .api
            .get_json("/auth/google/login", &[], None)
            .await?;
        Ok(response.authorization_url)
    }

    /// Best-effort logout. The server is told if it can be reached; the
    /// local token and cookies are dropped either way.
    pub async fn logout(&self) {
        if let Err(e) = self.api.post_ack("/auth/logout", None).await {
            warn!(error = %e, "Logout request failed, clearing local session anyway");
        }
        self.tokens.clear();
        if let Err(e) = self.api.cookies().clear() {
            warn!(error = %e, "Failed to clear stored session cookies");
        }
        info!("Logged out");
    }

    /// Forget the held token after the server rejected it.
    pub fn invalidate(&self) {
        self.tokens.clear();
    }
}

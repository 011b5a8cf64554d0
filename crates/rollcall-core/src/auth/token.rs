use std::fmt;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::api::ApiError;

/// Body of a successful `/auth/refresh`, also nested inside the local login reply.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Short-lived bearer credential.
///
/// `expires_in` is kept for display only. Nothing in this crate checks it;
/// a stale token is only discovered when the server rejects it.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    value: String,
    token_type: String,
    expires_in: Option<i64>,
    issued_at: DateTime<Utc>,
}

impl AccessToken {
    /// Wrap a raw credential. Empty strings are not credentials.
    pub fn new(value: impl Into<String>) -> Result<Self, ApiError> {
        let value = value.into();
        if value.is_empty() {
            return Err(ApiError::InvalidResponse("empty access token".to_string()));
        }
        Ok(Self {
            value,
            token_type: default_token_type(),
            expires_in: None,
            issued_at: Utc::now(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    pub fn expires_in(&self) -> Option<i64> {
        self.expires_in
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// When the server said the token would lapse, if it said.
    pub fn nominal_expiry(&self) -> Option<DateTime<Utc>> {
        self.expires_in
            .map(|secs| self.issued_at + Duration::seconds(secs))
    }
}

impl TryFrom<TokenResponse> for AccessToken {
    type Error = ApiError;

    fn try_from(response: TokenResponse) -> Result<Self, Self::Error> {
        let mut token = AccessToken::new(response.access_token)?;
        token.token_type = response.token_type;
        token.expires_in = response.expires_in;
        Ok(token)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

/// Holder of at most one access token, in memory only.
///
/// Every operation swaps a whole `Option` under a short lock, so readers
/// see either a complete token or none.
#[derive(Debug, Default)]
pub struct TokenStore {
    current: RwLock<Option<AccessToken>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<AccessToken> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set(&self, token: AccessToken) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    pub fn clear(&self) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

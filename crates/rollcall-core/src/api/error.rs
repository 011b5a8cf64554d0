use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Message shown when the server gives no usable `detail`.
pub const GENERIC_FAILURE_MESSAGE: &str = "Request failed";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not authenticated - please log in again")]
    Unauthenticated,

    #[error("Invalid login ID or password")]
    InvalidCredentials,

    #[error("Administrator role required")]
    AdminRequired,

    #[error("{0}")]
    Validation(String),

    #[error("Status {status}: {}", .detail.as_deref().unwrap_or(GENERIC_FAILURE_MESSAGE))]
    Status {
        status: StatusCode,
        detail: Option<String>,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in log output
const MAX_ERROR_BODY_LENGTH: usize = 500;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let cut = (0..=MAX_ERROR_BODY_LENGTH)
                .rev()
                .find(|i| body.is_char_boundary(*i))
                .unwrap_or(0);
            format!("{}... (truncated, {} total bytes)", &body[..cut], body.len())
        }
    }

    /// Build a status error, taking `detail` from a JSON body when it is a string.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let detail = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.detail)
            .and_then(|d| match d {
                serde_json::Value::String(s) => Some(s),
                _ => None,
            });
        ApiError::Status { status, detail }
    }

    /// Text to show a user for this failure.
    ///
    /// Server `detail` strings are passed through untouched. Status and
    /// transport failures without one collapse to a generic message.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { detail: Some(d), .. } => d.clone(),
            ApiError::Status { detail: None, .. }
            | ApiError::Network(_)
            | ApiError::InvalidResponse(_) => GENERIC_FAILURE_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }

    /// True when the server rejected the bearer token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Status { status, .. } if *status == StatusCode::UNAUTHORIZED)
    }
}

//! Subcommand implementations.
//!
//! Each command builds on a `Context` holding the loaded configuration and
//! a session manager whose cookie jar is persisted per server. Access
//! tokens live only for the duration of one invocation.

pub mod auth;
pub mod profile;
pub mod users;

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{anyhow, Context as _, Result};
use tracing::debug;

use rollcall_core::{ApiClient, ApiError, Config, CookieJar, SessionManager, TokenStore};

/// Shown whenever the session can no longer be used.
const RELOGIN_MESSAGE: &str = "Your session is no longer valid. Run `rollcall login` to sign in again.";

/// Shown when a non-administrator runs an administrator command.
const ADMIN_REQUIRED_MESSAGE: &str =
    "This command needs an administrator account. Run `rollcall me` to view your profile.";

pub struct Context {
    pub config: Config,
    pub session: SessionManager,
}

impl Context {
    pub fn new(api_url: Option<String>) -> Result<Self> {
        let config = Config::load().context("Failed to load configuration")?;
        let base_url = match api_url {
            Some(url) => url.trim().trim_end_matches('/').to_string(),
            None => config.api_base_url(),
        };

        let session_dir = config.session_dir(&base_url)?;
        let jar = Arc::new(CookieJar::load_or_empty(&session_dir));
        let api = ApiClient::with_timeout(&base_url, jar, config.request_timeout())
            .context("Failed to create HTTP client")?;
        debug!(base_url = %base_url, session_dir = %session_dir.display(), "Context ready");

        Ok(Self {
            config,
            session: SessionManager::new(api, Arc::new(TokenStore::new())),
        })
    }
}

/// Turn a library failure into the message a user sees.
///
/// Session failures drop the held token first. Server `detail` strings are
/// shown verbatim; anything else falls back to `fallback`.
pub fn explain(session: &SessionManager, err: ApiError, fallback: &str) -> anyhow::Error {
    match err {
        ApiError::Unauthenticated => {
            session.invalidate();
            anyhow!(RELOGIN_MESSAGE)
        }
        e if e.is_unauthorized() => {
            session.invalidate();
            anyhow!(RELOGIN_MESSAGE)
        }
        ApiError::AdminRequired => anyhow!(ADMIN_REQUIRED_MESSAGE),
        ApiError::Validation(message) => anyhow!(message),
        ApiError::Status {
            detail: Some(detail),
            ..
        } => anyhow!(detail),
        other => {
            debug!(error = %other, "Request failed");
            anyhow!(fallback.to_string())
        }
    }
}

/// Turn a failed administrator check into the message a user sees.
///
/// A non-administrator is pointed to `me`. Any other failure to load the
/// identity leaves the session untrusted, so the token is dropped.
pub fn explain_admin_gate(session: &SessionManager, err: ApiError) -> anyhow::Error {
    match err {
        ApiError::AdminRequired => anyhow!(ADMIN_REQUIRED_MESSAGE),
        other => {
            debug!(error = %other, "Identity check failed");
            session.invalidate();
            anyhow!(RELOGIN_MESSAGE)
        }
    }
}

/// Print `label` and read one trimmed line from stdin.
pub fn prompt_line(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Ask a yes/no question; anything but y/yes is a no.
pub fn confirm(question: &str) -> Result<bool> {
    let answer = prompt_line(&format!("{} [y/N] ", question))?;
    Ok(matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"))
}

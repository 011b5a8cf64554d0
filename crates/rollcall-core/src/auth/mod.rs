//! Authentication module for managing access tokens and sessions.
//!
//! This module provides:
//! - `TokenStore`: the single in-memory access token
//! - `SessionManager`: refresh-on-demand, login, logout and identity fetch
//! - `CookieJar`: the long-lived session cookie, persisted between runs
//!
//! Access tokens are never written to disk; only the cookie is.

pub mod cookies;
pub mod session;
pub mod token;

pub use cookies::CookieJar;
pub use session::SessionManager;
pub use token::{AccessToken, TokenResponse, TokenStore};

//! Core library for rollcall.
//!
//! Provides the pieces every front end needs to talk to the school
//! user-management API:
//!
//! - `auth`: the in-memory `TokenStore`, the refresh-on-demand
//!   `SessionManager`, and the persistent `CookieJar` holding the
//!   long-lived session cookie
//! - `api`: the HTTP `ApiClient` and the `ApiError` taxonomy
//! - `admin`: user listing, registration, soft deletion, CSV bulk
//!   preview/commit and export
//! - `models`: wire types for identities, user lists and bulk results
//! - `config`: on-disk configuration and directory resolution

pub mod admin;
pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod utils;

pub use admin::{BulkPreview, UserAdmin};
pub use api::{ApiClient, ApiError};
pub use auth::{AccessToken, CookieJar, SessionManager, TokenStore};
pub use config::Config;

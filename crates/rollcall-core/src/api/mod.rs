//! REST API client module for the school user-management service.
//!
//! This module provides the `ApiClient` that every call goes through and
//! the `ApiError` type it reports failures with.
//!
//! Authorized calls carry `Authorization: Bearer <token>`. The long-lived
//! session cookie travels separately through the client's cookie provider.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
pub use reqwest::StatusCode;

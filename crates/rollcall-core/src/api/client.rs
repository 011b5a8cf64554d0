//! API client for communicating with the school user-management REST API.
//!
//! `ApiClient` owns the HTTP connection pool and the cookie provider. It
//! knows nothing about tokens beyond attaching one when asked; deciding
//! whether a call is authorized is the session manager's job.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, multipart, Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::auth::CookieJar;

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Base URL used when neither the environment nor the config names one.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// API client for the user-management service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    cookies: Arc<CookieJar>,
}

impl ApiClient {
    /// Create a client using the transport's default timeout behaviour.
    pub fn new(base_url: &str, cookies: Arc<CookieJar>) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, cookies, None)
    }

    /// Create a client, optionally bounding every request by `timeout`.
    pub fn with_timeout(
        base_url: &str,
        cookies: Arc<CookieJar>,
        timeout: Option<Duration>,
    ) -> Result<Self, ApiError> {
        let mut builder = Client::builder().cookie_provider(Arc::clone(&cookies));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            cookies,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The cookie jar holding the long-lived session cookie.
    pub fn cookies(&self) -> &Arc<CookieJar> {
        &self.cookies
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Start a request. The bearer header is attached only when a token is given.
    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let url = self.url(path);
        debug!(method = %method, url = %url, authorized = token.is_some(), "API request");

        let builder = self
            .client
            .request(method, url)
            .header(header::ACCEPT, "application/json");
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Check if response is successful, returning an error with the server detail if not.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            debug!(status = %status, body = %ApiError::truncate_body(&body), "API request failed");
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn send(builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send().await?;
        Self::check_response(response).await
    }

    async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    // ===== Request helpers =====

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        token: Option<&str>,
    ) -> Result<T, ApiError> {
        let builder = self.request(Method::GET, path, token).query(query);
        Self::parse_json(Self::send(builder).await?).await
    }

    /// Download a response body as raw bytes (CSV exports).
    pub async fn get_bytes(
        &self,
        path: &str,
        query: &[(&str, String)],
        token: Option<&str>,
    ) -> Result<Vec<u8>, ApiError> {
        let builder = self.request(Method::GET, path, token).query(query);
        let response = Self::send(builder).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// POST a JSON body and decode the JSON reply.
    pub async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        token: Option<&str>,
    ) -> Result<T, ApiError> {
        let builder = self.request(Method::POST, path, token).json(body);
        Self::parse_json(Self::send(builder).await?).await
    }

    /// POST without a body and decode the JSON reply.
    pub async fn post_for_json<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
    ) -> Result<T, ApiError> {
        let builder = self.request(Method::POST, path, token);
        Self::parse_json(Self::send(builder).await?).await
    }

    /// POST a multipart form. No JSON content type is set; the form supplies its own.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        form: multipart::Form,
        token: Option<&str>,
    ) -> Result<T, ApiError> {
        let builder = self
            .request(Method::POST, path, token)
            .query(query)
            .multipart(form);
        Self::parse_json(Self::send(builder).await?).await
    }

    /// POST a JSON body, caring only that the server accepted it.
    pub async fn post_json_ack<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        token: Option<&str>,
    ) -> Result<(), ApiError> {
        let builder = self.request(Method::POST, path, token).json(body);
        Self::send(builder).await.map(|_| ())
    }

    /// POST without a body, caring only that the server accepted it.
    pub async fn post_ack(&self, path: &str, token: Option<&str>) -> Result<(), ApiError> {
        let builder = self.request(Method::POST, path, token);
        Self::send(builder).await.map(|_| ())
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> Result<(), ApiError> {
        let builder = self.request(Method::DELETE, path, token);
        Self::send(builder).await.map(|_| ())
    }
}

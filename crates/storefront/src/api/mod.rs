//! Marketplace REST API clients.
//!
//! # Architecture
//!
//! - Plain JSON over HTTP with `reqwest`; bearer auth from [`AuthContext`]
//! - Every response is an envelope `{ success, message, data }`
//! - No retries: callers decide whether to fall back to local state
//! - Catalog lookups are cached in memory via `moka`
//!
//! # Clients
//!
//! - [`RemoteCartClient`] - the authenticated user's cart resource
//! - [`CatalogClient`] - product details used to build cart lines
//!
//! # Example
//!
//! ```rust,ignore
//! use bazaar_storefront::api::{ApiClient, CartRemote, RemoteCartClient};
//!
//! let api = ApiClient::new(&config.api, auth)?;
//! let cart = RemoteCartClient::new(api.clone());
//! let lines = cart.get_cart().await?;
//! ```

mod cart;
mod catalog;

pub use cart::{CartRemote, RemoteCartClient};
pub use catalog::{CatalogClient, ProductSummary};

use std::sync::Arc;

use reqwest::Method;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

use crate::auth::AuthContext;
use crate::config::ApiConfig;

/// Longest slice of a response body kept in logs and error messages.
const BODY_SNIPPET_CHARS: usize = 200;

/// Errors that can occur when calling the marketplace API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Envelope reported `success: false`.
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// Endpoint requires a credential and the session has none.
    #[error("Not authenticated")]
    Unauthenticated,

    /// Endpoint path could not be joined onto the base URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ApiError {
    /// Message suitable for a transient user notification.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { message, .. } | Self::Rejected(message) if !message.is_empty() => {
                message.clone()
            }
            Self::Unauthenticated => "Please sign in to sync your cart".to_string(),
            _ => "Request failed".to_string(),
        }
    }
}

/// Standard response envelope.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

const fn default_success() -> bool {
    true
}

/// Shared HTTP plumbing for the API clients.
///
/// Cheaply cloneable; all clones share one connection pool and one
/// session [`AuthContext`].
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    auth: AuthContext,
}

impl ApiClient {
    /// Create a client for the configured API.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ApiConfig, auth: AuthContext) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
                auth,
            }),
        })
    }

    /// The session this client authenticates as.
    #[must_use]
    pub fn auth(&self) -> &AuthContext {
        &self.inner.auth
    }

    /// Send a request and unwrap the response envelope.
    ///
    /// When `require_auth` is set and the session has no credential the call
    /// fails with [`ApiError::Unauthenticated`] without touching the network.
    pub(crate) async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
        require_auth: bool,
    ) -> Result<Envelope<T>, ApiError> {
        let authorization = self.inner.auth.authorization_header();
        if require_auth && authorization.is_none() {
            return Err(ApiError::Unauthenticated);
        }

        let url = self.inner.base_url.join(path)?;
        debug!(%method, %url, "Sending API request");

        let mut request = self
            .inner
            .client
            .request(method, url)
            .header("Accept", "application/json");
        if let Some(value) = authorization {
            request = request.header("Authorization", value);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<Envelope<serde_json::Value>>(&response_text)
                .ok()
                .and_then(|e| e.message)
                .unwrap_or_else(|| snippet(&response_text));
            error!(
                status = %status,
                body = %snippet(&response_text),
                "Marketplace API returned non-success status"
            );
            return Err(ApiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: Envelope<T> = match serde_json::from_str(&response_text) {
            Ok(envelope) => envelope,
            Err(e) => {
                error!(
                    error = %e,
                    body = %snippet(&response_text),
                    "Failed to parse marketplace API response"
                );
                return Err(ApiError::Parse(e));
            }
        };

        if !envelope.success {
            return Err(ApiError::Rejected(envelope.message.unwrap_or_default()));
        }

        Ok(envelope)
    }
}

fn snippet(body: &str) -> String {
    body.chars().take(BODY_SNIPPET_CHARS).collect()
}

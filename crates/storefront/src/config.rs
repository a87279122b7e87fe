//! Storefront client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BAZAAR_API_URL` - Base URL of the marketplace REST API
//!   (e.g., `https://api.bazaar.example/api/`)
//!
//! ## Optional
//! - `BAZAAR_STORAGE_DIR` - Directory holding local storage slots (default: `.bazaar`)
//! - `BAZAAR_CART_KEY` - Storage slot holding the local cart (default: `cart`)
//! - `BAZAAR_COOKIES` - Cookie header captured from the browser session
//! - `BAZAAR_MERGE_POLICY` - `overwrite` or `preserve-unsynced` (default: `overwrite`)
//! - `BAZAAR_CATALOG_CACHE_TTL_SECS` - Product cache lifetime (default: 300)
//! - `BAZAAR_CURRENCY` - Display currency code (default: `INR`)

use std::path::PathBuf;
use std::time::Duration;

use bazaar_core::CurrencyCode;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use crate::cart::MergePolicy;

const DEFAULT_STORAGE_DIR: &str = ".bazaar";
const DEFAULT_CART_KEY: &str = "cart";
const DEFAULT_CATALOG_CACHE_TTL_SECS: u64 = 300;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Marketplace API settings
    pub api: ApiConfig,
    /// Directory for local storage slots
    pub storage_dir: PathBuf,
    /// Storage slot holding the local cart
    pub cart_key: String,
    /// How remote reads are combined with the local cart
    pub merge_policy: MergePolicy,
    /// Currency used when formatting cart views
    pub currency: CurrencyCode,
}

/// Marketplace REST API configuration.
///
/// Implements `Debug` manually to redact the cookie header.
#[derive(Clone)]
pub struct ApiConfig {
    /// Base URL, always ending in `/`
    pub base_url: Url,
    /// Cookie header from the browser session (may carry the auth token)
    pub cookies: Option<SecretString>,
    /// Lifetime of cached catalog lookups
    pub catalog_cache_ttl: Duration,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("cookies", &self.cookies.as_ref().map(|_| "[REDACTED]"))
            .field("catalog_cache_ttl", &self.catalog_cache_ttl)
            .finish()
    }
}

impl ApiConfig {
    /// Build an API config for a base URL with default cache settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL does not parse or
    /// cannot serve as a base.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url("BAZAAR_API_URL", base_url)?,
            cookies: None,
            catalog_cache_ttl: Duration::from_secs(DEFAULT_CATALOG_CACHE_TTL_SECS),
        })
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Lookup(lookup);

        let base_url = parse_base_url("BAZAAR_API_URL", &env.required("BAZAAR_API_URL")?)?;
        let ttl_secs = env
            .or_default(
                "BAZAAR_CATALOG_CACHE_TTL_SECS",
                &DEFAULT_CATALOG_CACHE_TTL_SECS.to_string(),
            )
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar(
                    "BAZAAR_CATALOG_CACHE_TTL_SECS".to_string(),
                    e.to_string(),
                )
            })?;

        let merge_policy = env
            .or_default("BAZAAR_MERGE_POLICY", "overwrite")
            .parse::<MergePolicy>()
            .map_err(|e| ConfigError::InvalidEnvVar("BAZAAR_MERGE_POLICY".to_string(), e))?;

        let currency = parse_currency(&env.or_default("BAZAAR_CURRENCY", "INR"))?;

        Ok(Self {
            api: ApiConfig {
                base_url,
                cookies: env.optional("BAZAAR_COOKIES").map(SecretString::from),
                catalog_cache_ttl: Duration::from_secs(ttl_secs),
            },
            storage_dir: PathBuf::from(env.or_default("BAZAAR_STORAGE_DIR", DEFAULT_STORAGE_DIR)),
            cart_key: env.or_default("BAZAAR_CART_KEY", DEFAULT_CART_KEY),
            merge_policy,
            currency,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Lookup<F>(F);

impl<F: Fn(&str) -> Option<String>> Lookup<F> {
    /// Get a required variable. Empty values count as missing.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get an optional variable, treating empty values as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }
}

/// Parse a base URL, appending a trailing slash so relative joins keep the path.
fn parse_base_url(var_name: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut normalized = raw.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    let url = Url::parse(&normalized)
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            "URL cannot be used as a base".to_string(),
        ));
    }
    Ok(url)
}

fn parse_currency(raw: &str) -> Result<CurrencyCode, ConfigError> {
    CurrencyCode::from_code(raw).ok_or_else(|| {
        ConfigError::InvalidEnvVar(
            "BAZAAR_CURRENCY".to_string(),
            format!("unsupported currency '{}'", raw.trim()),
        )
    })
}

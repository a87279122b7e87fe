//! Session authentication context.
//!
//! The browser session may carry a bearer credential in several places: the
//! `token` cookie, or one of a few local storage slots left behind by the
//! buyer and seller login flows. [`AuthContext::resolve`] checks them once,
//! in a fixed order (first match wins), and the resulting context is handed
//! to every consumer that needs it.
//!
//! Authentication is a branch condition, not an error: an anonymous context
//! simply selects local-only cart mode.

use std::collections::HashMap;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::storage::KeyValueStore;

/// Cookie and storage slot names written by the login flows.
pub mod keys {
    /// Cookie holding the bearer token.
    pub const COOKIE_TOKEN: &str = "token";

    /// Cookie flag set to `true` after login.
    pub const COOKIE_LOGGED_IN: &str = "isLoggedIn";

    /// Cookie holding `buyer` or `seller`.
    pub const COOKIE_USER_TYPE: &str = "userType";

    /// Cookie holding the URL-encoded JSON user snapshot.
    pub const COOKIE_USER: &str = "user";

    /// Local storage slots checked for a token after the cookie, in order.
    pub const TOKEN_SLOTS: &[&str] = &["token", "authToken", "sellerToken"];
}

/// Where the session credential was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialOrigin {
    /// The `token` cookie.
    Cookie,
    /// A named local storage slot.
    Storage(&'static str),
    /// Supplied directly by the caller.
    Explicit,
}

/// Account role recorded by the login flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserType {
    Buyer,
    Seller,
}

impl UserType {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "buyer" | "user" | "customer" => Some(Self::Buyer),
            "seller" | "vendor" => Some(Self::Seller),
            _ => None,
        }
    }
}

/// Profile fields kept in the `user` cookie.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserSnapshot {
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Authentication state for one session.
#[derive(Clone, Default)]
pub struct AuthContext {
    token: Option<SecretString>,
    origin: Option<CredentialOrigin>,
    user_type: Option<UserType>,
    logged_in_flag: bool,
    user: Option<UserSnapshot>,
}

impl std::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthContext")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("origin", &self.origin)
            .field("user_type", &self.user_type)
            .field("logged_in_flag", &self.logged_in_flag)
            .field("user", &self.user)
            .finish()
    }
}

impl AuthContext {
    /// A session with no credential.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A session authenticated with a known token.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(SecretString::from(token.into())),
            origin: Some(CredentialOrigin::Explicit),
            ..Self::default()
        }
    }

    /// Resolve the session from a cookie header and local storage slots.
    ///
    /// The token is taken from the first non-empty location among the `token`
    /// cookie and [`keys::TOKEN_SLOTS`]. Unreadable slots are skipped.
    #[must_use]
    pub fn resolve(cookie_header: Option<&str>, storage: &dyn KeyValueStore) -> Self {
        let cookies = cookie_header.map(parse_cookies).unwrap_or_default();

        let mut context = Self {
            user_type: cookies
                .get(keys::COOKIE_USER_TYPE)
                .and_then(|v| UserType::parse(v)),
            logged_in_flag: cookies
                .get(keys::COOKIE_LOGGED_IN)
                .is_some_and(|v| v.eq_ignore_ascii_case("true")),
            user: cookies
                .get(keys::COOKIE_USER)
                .and_then(|raw| parse_user_snapshot(raw)),
            ..Self::default()
        };

        if let Some(token) = cookies.get(keys::COOKIE_TOKEN).filter(|t| !t.is_empty()) {
            context.token = Some(SecretString::from(token.clone()));
            context.origin = Some(CredentialOrigin::Cookie);
        } else {
            for &slot in keys::TOKEN_SLOTS {
                match storage.get(slot) {
                    Ok(Some(value)) if !value.trim().is_empty() => {
                        context.token = Some(SecretString::from(value.trim().to_string()));
                        context.origin = Some(CredentialOrigin::Storage(slot));
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => warn!(slot, error = %e, "Skipping unreadable token slot"),
                }
            }
        }

        debug!(
            authenticated = context.is_authenticated(),
            origin = ?context.origin,
            "Resolved session auth"
        );
        context
    }

    /// Whether a bearer credential is present.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// The bearer token, if any.
    #[must_use]
    pub const fn bearer_token(&self) -> Option<&SecretString> {
        self.token.as_ref()
    }

    /// `Authorization` header value, if authenticated.
    #[must_use]
    pub fn authorization_header(&self) -> Option<String> {
        self.token
            .as_ref()
            .map(|t| format!("Bearer {}", t.expose_secret()))
    }

    #[must_use]
    pub const fn origin(&self) -> Option<CredentialOrigin> {
        self.origin
    }

    #[must_use]
    pub const fn user_type(&self) -> Option<UserType> {
        self.user_type
    }

    /// The `isLoggedIn` cookie flag. Informational; the token decides.
    #[must_use]
    pub const fn logged_in_flag(&self) -> bool {
        self.logged_in_flag
    }

    #[must_use]
    pub const fn user(&self) -> Option<&UserSnapshot> {
        self.user.as_ref()
    }
}

/// Split a cookie header into name/value pairs.
///
/// Values are percent-decoded. Pairs without `=` are skipped, and the first
/// occurrence of a name wins.
#[must_use]
pub fn parse_cookies(header: &str) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    for pair in header.split(';') {
        let Some((name, value)) = pair.split_once('=') else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        let value = value.trim();
        let decoded = urlencoding::decode(value)
            .map_or_else(|_| value.to_string(), std::borrow::Cow::into_owned);
        cookies.entry(name.to_string()).or_insert(decoded);
    }
    cookies
}

fn parse_user_snapshot(raw: &str) -> Option<UserSnapshot> {
    match serde_json::from_str(raw) {
        Ok(user) => Some(user),
        Err(e) => {
            debug!(error = %e, "Ignoring malformed user cookie");
            None
        }
    }
}

//! Bearer token as returned by the token endpoint

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Token endpoint response plus the locally derived `expiry`.
///
/// `expiry` is epoch seconds. A token without `expiry` never expires.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthToken {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<i64>,
}

impl OAuthToken {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: None,
            expires_in: None,
            scope: None,
            expiry: None,
        }
    }

    pub fn with_expires_in(mut self, seconds: i64) -> Self {
        self.expires_in = Some(seconds);
        self
    }

    pub fn with_expiry(mut self, epoch_seconds: i64) -> Self {
        self.expiry = Some(epoch_seconds);
        self
    }

    /// Derive `expiry = issued_at + expires_in`. Without a nonzero
    /// `expires_in` the token has no expiry, whatever the body carried.
    pub fn stamped(mut self, issued_at: i64) -> Self {
        self.expiry = self
            .expires_in
            .filter(|s| *s != 0)
            .map(|lifetime| issued_at.saturating_add(lifetime));
        self
    }

    /// Strictly past `expiry`; a token expiring exactly at `now` is still valid.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expiry.is_some_and(|expiry| expiry < now)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(unix_now())
    }

    /// `Authorization` header value.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

impl fmt::Debug for OAuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthToken")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .field("expiry", &self.expiry)
            .finish()
    }
}

/// Current time in epoch seconds.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

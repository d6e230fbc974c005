//! Client-credentials auth manager
//!
//! Holds one credential pair and at most one token. Token reads (`apply`,
//! `is_expired`) take a single snapshot under a std `RwLock`; fetches are
//! serialized per manager by an async mutex so two concurrent fetches never
//! interleave their writes.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use reqwest::header::AUTHORIZATION;
use tracing::{debug, info, warn};

use super::credentials::Credentials;
use super::token::{OAuthToken, unix_now};
use super::{AuthManager, TokenIssuer};
use crate::BoxFuture;
use crate::error::{AuthError, Error, Result};
use crate::http::{FormFields, HttpRequest};

#[derive(Default)]
struct TokenState {
    token: RwLock<Option<OAuthToken>>,
    fetch: tokio::sync::Mutex<()>,
}

impl TokenState {
    fn read(&self) -> RwLockReadGuard<'_, Option<OAuthToken>> {
        self.token.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<OAuthToken>> {
        self.token.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// `AuthManager` for the OAuth2 client-credentials grant.
///
/// Cloning shares the token state; a token fetched through one clone is seen
/// by all of them.
#[derive(Clone)]
pub struct ClientCredentialsAuthManager {
    credentials: Credentials,
    state: Arc<TokenState>,
    issuer: Arc<dyn TokenIssuer>,
}

impl ClientCredentialsAuthManager {
    pub fn new(
        credentials: Credentials,
        token: Option<OAuthToken>,
        issuer: Arc<dyn TokenIssuer>,
    ) -> Self {
        let state = TokenState {
            token: RwLock::new(token),
            fetch: tokio::sync::Mutex::new(()),
        };
        Self {
            credentials,
            state: Arc::new(state),
            issuer,
        }
    }

    /// Same credentials and token state, fetching through `issuer` from now on.
    pub(crate) fn rebind(&self, issuer: Arc<dyn TokenIssuer>) -> Self {
        Self {
            credentials: self.credentials.clone(),
            state: Arc::clone(&self.state),
            issuer,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Snapshot of the held token.
    pub fn token(&self) -> Option<OAuthToken> {
        self.state.read().clone()
    }

    /// True iff the client id and secret match exactly and the tokens are
    /// both absent or both present and equal.
    pub fn matches(&self, client_id: &str, client_secret: &str, token: Option<&OAuthToken>) -> bool {
        self.credentials.matches(client_id, client_secret) && self.state.read().as_ref() == token
    }

    pub fn is_expired(&self) -> Result<bool> {
        match self.state.read().as_ref() {
            Some(token) => Ok(token.is_expired_at(unix_now())),
            None => Err(Error::Precondition(
                "OAuth token is not set; fetch a token first".into(),
            )),
        }
    }

    /// Stamp `Authorization: Bearer <token>`. Fails without sending anything
    /// when the token is missing or expired.
    pub fn apply(&self, mut request: HttpRequest) -> Result<HttpRequest> {
        let guard = self.state.read();
        let token = guard.as_ref().ok_or(AuthError::NotAuthorized)?;
        if token.is_expired_at(unix_now()) {
            return Err(AuthError::TokenExpired.into());
        }
        request.set_header(AUTHORIZATION.as_str(), &token.bearer())?;
        Ok(request)
    }

    /// Exchange the credentials for a new token and store it.
    ///
    /// `fields` are extra form fields for the token request; nulls are
    /// dropped. On failure the previously held token is kept.
    pub async fn fetch_token(&self, fields: Option<FormFields>) -> Result<OAuthToken> {
        let _serialized = self.state.fetch.lock().await;
        let authorization = self.credentials.basic_authorization();
        debug!(client_id = %self.credentials.client_id(), "requesting OAuth token");

        match self.issuer.request_token(&authorization, None, fields).await {
            Ok(token) => {
                let token = token.stamped(unix_now());
                info!(
                    client_id = %self.credentials.client_id(),
                    expires_in = ?token.expires_in,
                    expiry = ?token.expiry,
                    "OAuth token acquired"
                );
                crate::metrics::record_token_fetch("success");
                *self.state.write() = Some(token.clone());
                Ok(token)
            }
            Err(e) => {
                warn!(client_id = %self.credentials.client_id(), error = %e, "OAuth token fetch failed");
                crate::metrics::record_token_fetch("failure");
                Err(e)
            }
        }
    }

    pub fn fetch_token_blocking(&self, fields: Option<FormFields>) -> Result<OAuthToken> {
        crate::blocking::block_on(self.fetch_token(fields))
    }
}

impl AuthManager for ClientCredentialsAuthManager {
    fn id(&self) -> &str {
        "client_credentials"
    }

    fn is_expired(&self) -> Result<bool> {
        ClientCredentialsAuthManager::is_expired(self)
    }

    fn apply(&self, request: HttpRequest) -> Result<HttpRequest> {
        ClientCredentialsAuthManager::apply(self, request)
    }

    fn fetch_token(&self, fields: Option<FormFields>) -> BoxFuture<'_, Result<OAuthToken>> {
        Box::pin(ClientCredentialsAuthManager::fetch_token(self, fields))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for ClientCredentialsAuthManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentialsAuthManager")
            .field("credentials", &self.credentials)
            .field("token", &*self.state.read())
            .finish()
    }
}

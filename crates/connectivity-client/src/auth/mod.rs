//! Authentication: credential/token model, the `AuthManager` seam and the
//! named registry the dispatcher looks scopes up in.

pub mod client_credentials;
pub mod credentials;
pub mod token;

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub use client_credentials::ClientCredentialsAuthManager;
pub use credentials::Credentials;
pub use token::{OAuthToken, unix_now};

use crate::BoxFuture;
use crate::error::Result;
use crate::http::{FormFields, HttpRequest};

/// Scope name under which the client-credentials manager is registered.
pub const GLOBAL_SCOPE: &str = "global";

/// Authenticates outgoing requests for one scope.
///
/// Implementations must be `Send + Sync`; the client shares them across
/// tasks behind `Arc`.
pub trait AuthManager: Send + Sync {
    /// Short identifier for logs (e.g. "client_credentials").
    fn id(&self) -> &str;

    /// Whether the held token is past its expiry.
    /// `Error::Precondition` when no token is held.
    fn is_expired(&self) -> Result<bool>;

    /// Stamp authentication onto `request`. Never fetches a token.
    fn apply(&self, request: HttpRequest) -> Result<HttpRequest>;

    /// Obtain and store a new token.
    fn fetch_token(&self, fields: Option<FormFields>) -> BoxFuture<'_, Result<OAuthToken>>;

    /// Concrete-type recovery, used when a client is rebuilt.
    fn as_any(&self) -> &dyn Any;
}

/// Issues tokens for a `Basic` client authorization.
///
/// Implemented by `OAuthAuthorizationController`; the auth manager depends
/// on this seam rather than on the controller.
pub trait TokenIssuer: Send + Sync {
    fn request_token<'a>(
        &'a self,
        authorization: &'a str,
        scope: Option<&'a str>,
        fields: Option<FormFields>,
    ) -> BoxFuture<'a, Result<OAuthToken>>;
}

/// Scope name → auth manager.
#[derive(Clone, Default)]
pub struct AuthManagers {
    managers: HashMap<String, Arc<dyn AuthManager>>,
}

impl AuthManagers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, scope: &str) -> Option<&Arc<dyn AuthManager>> {
        self.managers.get(scope)
    }

    /// Register `manager` under `scope`, returning the one it replaced.
    pub fn insert(
        &mut self,
        scope: impl Into<String>,
        manager: Arc<dyn AuthManager>,
    ) -> Option<Arc<dyn AuthManager>> {
        self.managers.insert(scope.into(), manager)
    }

    pub fn contains(&self, scope: &str) -> bool {
        self.managers.contains_key(scope)
    }

    pub fn len(&self) -> usize {
        self.managers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.managers.is_empty()
    }

    /// Registered scope names, sorted.
    pub fn scopes(&self) -> Vec<&str> {
        let mut scopes: Vec<&str> = self.managers.keys().map(String::as_str).collect();
        scopes.sort_unstable();
        scopes
    }
}

impl fmt::Debug for AuthManagers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthManagers")
            .field("scopes", &self.scopes())
            .finish()
    }
}

//! Connectivity management API client
//!
//! Authenticates with the OAuth2 client-credentials grant and issues
//! bearer-authenticated REST calls against the connectivity management
//! service. The crate is a standalone library; `services/connectivity-cli`
//! is a thin bootstrap binary on top of it.
//!
//! Request flow:
//! 1. `ClientConfig` is validated and turned into a `ConnectivityClient`
//! 2. The client installs a `ClientCredentialsAuthManager` under the `"global"` scope
//! 3. `fetch_token()` exchanges the client id/secret for a bearer token
//!    at `{oauth server}/oauth2/token`
//! 4. Controllers build an `ApiCall`; the `Dispatcher` resolves the base URL,
//!    stamps the bearer token, sends the request and classifies the response
//! 5. Rebuilding via `to_config()` keeps the fetched token when credentials
//!    are unchanged

pub mod auth;
pub mod blocking;
pub mod client;
pub mod config;
pub mod controllers;
pub mod error;
pub mod http;
pub mod metrics;
pub mod models;
pub mod server;

#[cfg(test)]
mod test_support;

use std::future::Future;
use std::pin::Pin;

pub use auth::{
    AuthManager, AuthManagers, ClientCredentialsAuthManager, Credentials, GLOBAL_SCOPE,
    OAuthToken, TokenIssuer,
};
pub use client::ConnectivityClient;
pub use common::Secret;
pub use config::ClientConfig;
pub use controllers::{ApiCall, Dispatcher, OAuthAuthorizationController, SessionController};
pub use error::{
    ApiError, AuthError, Error, OAuthFailure, OAuthProviderError, RestErrorResponse, Result,
};
pub use http::{
    ArraySerialization, FormFields, HttpCallback, HttpClientConfig, HttpContext, HttpRequest,
    HttpResponse, HttpTransport, RequestBody, ReqwestTransport, ResponseRecorder,
};
pub use models::{LogInRequest, LogInResponse};
pub use server::{Environment, Server};
pub use tokio_util::sync::CancellationToken;

/// Boxed future used at the trait seams (`AuthManager`, `TokenIssuer`,
/// `HttpTransport`) so they stay dyn-compatible.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Header carrying the service-session token on every call.
pub const SESSION_TOKEN_HEADER: &str = "VZ-M2M-Token";

/// Default `user-agent` sent when `HttpClientConfig::user_agent` is unset.
pub const USER_AGENT: &str = concat!("connectivity-client-rust/", env!("CARGO_PKG_VERSION"));

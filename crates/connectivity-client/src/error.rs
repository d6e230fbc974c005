//! Error taxonomy for connectivity client operations
//!
//! Token state errors (`Precondition`, `Auth`) are raised locally before any
//! I/O. Response errors (`OAuthProvider`, `RestError`, `Api`) carry the
//! status and raw body of the response that produced them. Nothing is
//! retried; every variant surfaces to the caller of the originating call.

use reqwest::header::HeaderMap;
use serde::Deserialize;

use crate::http::HttpResponse;

/// Errors from connectivity client operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("precondition failed: {0}")]
    Precondition(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    OAuthProvider(#[from] OAuthProviderError),

    #[error(transparent)]
    RestError(#[from] RestErrorResponse),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("request cancelled")]
    Cancelled,

    #[error("invalid response body: {0}")]
    Deserialize(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("no auth manager registered for scope {0:?}")]
    UnknownAuthScope(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("blocking call made from within an async runtime; use the async form instead")]
    BlockingInAsyncContext,
}

impl Error {
    /// HTTP status of the response behind this error, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::OAuthProvider(e) => Some(e.status),
            Error::RestError(e) => Some(e.status),
            Error::Api(e) => Some(e.status),
            _ => None,
        }
    }
}

/// Result alias for connectivity client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Bearer token missing or expired when applying authentication.
///
/// The caller must fetch a token (and rebuild or retry) before the call can
/// succeed; applying never refreshes on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("client is not authorized: an OAuth token is needed to make API calls")]
    NotAuthorized,

    #[error("OAuth token is expired: a valid token is needed to make API calls")]
    TokenExpired,
}

/// Non-success response that no endpoint-specific mapping claimed.
#[derive(Debug, Clone, thiserror::Error)]
#[error("HTTP response not OK (status {status})")]
pub struct ApiError {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

impl ApiError {
    pub(crate) fn from_response(response: &HttpResponse) -> Self {
        Self {
            status: response.status,
            headers: response.headers.clone(),
            body: response.body.clone(),
        }
    }
}

/// Why the token endpoint rejected a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum OAuthFailure {
    /// HTTP 400 from the token endpoint
    #[error("OAuth 2 provider returned an error")]
    ProviderError,

    /// HTTP 401 from the token endpoint
    #[error("OAuth 2 provider says client authentication failed")]
    ClientAuthenticationFailed,
}

/// Token endpoint rejection. Carries the RFC 6749 error fields when the
/// provider sent them.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{}{}", .reason, detail(.error, .error_description))]
pub struct OAuthProviderError {
    pub reason: OAuthFailure,
    pub status: u16,
    pub error: Option<String>,
    pub error_description: Option<String>,
    pub error_uri: Option<String>,
    pub body: String,
}

#[derive(Deserialize)]
struct OAuthErrorBody {
    error: Option<String>,
    error_description: Option<String>,
    error_uri: Option<String>,
}

impl OAuthProviderError {
    pub(crate) fn from_response(reason: OAuthFailure, response: &HttpResponse) -> Self {
        let parsed = serde_json::from_str::<OAuthErrorBody>(&response.body).ok();
        let (error, error_description, error_uri) = match parsed {
            Some(b) => (b.error, b.error_description, b.error_uri),
            None => (None, None, None),
        };
        Self {
            reason,
            status: response.status,
            error,
            error_description,
            error_uri,
            body: response.body.clone(),
        }
    }
}

/// Structured error body returned by business endpoints (`errorCode`,
/// `errorMessage`).
#[derive(Debug, Clone, thiserror::Error)]
#[error("error response (status {}){}", .status, detail(.error_code, .error_message))]
pub struct RestErrorResponse {
    pub status: u16,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub body: String,
}

#[derive(Deserialize)]
struct RestErrorBody {
    #[serde(rename = "errorCode")]
    error_code: Option<String>,
    #[serde(rename = "errorMessage")]
    error_message: Option<String>,
}

impl RestErrorResponse {
    pub(crate) fn from_response(response: &HttpResponse) -> Self {
        let parsed = serde_json::from_str::<RestErrorBody>(&response.body).ok();
        let (error_code, error_message) = match parsed {
            Some(b) => (b.error_code, b.error_message),
            None => (None, None),
        };
        Self {
            status: response.status,
            error_code,
            error_message,
            body: response.body.clone(),
        }
    }
}

fn detail(code: &Option<String>, message: &Option<String>) -> String {
    match (code, message) {
        (Some(code), Some(message)) => format!(": {code}: {message}"),
        (Some(only), None) | (None, Some(only)) => format!(": {only}"),
        (None, None) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse::new(status, HeaderMap::new(), Bytes::from(body.to_owned()))
    }

    #[test]
    fn auth_errors_are_distinguishable() {
        assert_ne!(AuthError::NotAuthorized, AuthError::TokenExpired);
        assert!(AuthError::NotAuthorized.to_string().contains("not authorized"));
        assert!(AuthError::TokenExpired.to_string().contains("expired"));
    }

    #[test]
    fn oauth_provider_error_parses_rfc6749_body() {
        let err = OAuthProviderError::from_response(
            OAuthFailure::ProviderError,
            &response(
                400,
                r#"{"error":"invalid_scope","error_description":"scope not allowed"}"#,
            ),
        );
        assert_eq!(err.status, 400);
        assert_eq!(err.error.as_deref(), Some("invalid_scope"));
        assert_eq!(err.error_uri, None);
        assert_eq!(
            err.to_string(),
            "OAuth 2 provider returned an error: invalid_scope: scope not allowed"
        );
    }

    #[test]
    fn oauth_provider_error_tolerates_non_json_body() {
        let err = OAuthProviderError::from_response(
            OAuthFailure::ClientAuthenticationFailed,
            &response(401, "<html>denied</html>"),
        );
        assert_eq!(err.error, None);
        assert_eq!(err.body, "<html>denied</html>");
        assert_eq!(
            err.to_string(),
            "OAuth 2 provider says client authentication failed"
        );
    }

    #[test]
    fn rest_error_response_parses_error_fields() {
        let err = RestErrorResponse::from_response(&response(
            400,
            r#"{"errorCode":"REQUEST_FAILED.UnexpectedError","errorMessage":"Could not log in"}"#,
        ));
        assert_eq!(err.error_code.as_deref(), Some("REQUEST_FAILED.UnexpectedError"));
        assert_eq!(err.error_message.as_deref(), Some("Could not log in"));
        assert!(err.to_string().starts_with("error response (status 400)"));
    }

    #[test]
    fn status_is_exposed_for_response_errors_only() {
        let api: Error = ApiError::from_response(&response(503, "busy")).into();
        assert_eq!(api.status(), Some(503));
        assert_eq!(Error::Cancelled.status(), None);
        assert_eq!(Error::from(AuthError::TokenExpired).status(), None);
    }
}

//! Token endpoint client (`POST {oauth server}/oauth2/token`)

use reqwest::Method;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::base::{ApiCall, Dispatcher};
use crate::BoxFuture;
use crate::auth::{OAuthToken, TokenIssuer};
use crate::error::{Error, OAuthFailure, OAuthProviderError, Result};
use crate::http::{FormFields, HttpContext};
use crate::server::Server;

/// Issues client-credentials tokens.
#[derive(Clone)]
pub struct OAuthAuthorizationController {
    dispatcher: Dispatcher,
}

impl OAuthAuthorizationController {
    pub(crate) fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Request a token with the client-credentials grant.
    ///
    /// `authorization` is the full header value (`Basic ...`). `scope` is
    /// omitted from the form when `None`; null-valued `fields` are dropped.
    /// A 400 maps to `OAuthFailure::ProviderError`, a 401 to
    /// `OAuthFailure::ClientAuthenticationFailed`, any other non-2xx to
    /// `Error::Api`.
    pub async fn request_token(
        &self,
        authorization: &str,
        scope: Option<&str>,
        fields: Option<FormFields>,
    ) -> Result<OAuthToken> {
        self.request_token_with_cancellation(authorization, scope, fields, &CancellationToken::new())
            .await
    }

    pub async fn request_token_with_cancellation(
        &self,
        authorization: &str,
        scope: Option<&str>,
        fields: Option<FormFields>,
        cancel: &CancellationToken,
    ) -> Result<OAuthToken> {
        debug!(scope, "requesting client-credentials token");
        let call = ApiCall::new("oauth.request_token", Method::POST, Server::OAuthServer, "/oauth2/token")
            .header("authorization", authorization)
            .form_field("grant_type", "client_credentials")
            .form_field("scope", scope.map_or(Value::Null, Value::from))
            .form_fields(fields.unwrap_or_default())
            .error_case(400, provider_error)
            .error_case(401, client_authentication_failed);
        self.dispatcher.execute_json(call, cancel).await
    }

    pub fn request_token_blocking(
        &self,
        authorization: &str,
        scope: Option<&str>,
        fields: Option<FormFields>,
    ) -> Result<OAuthToken> {
        crate::blocking::block_on(self.request_token(authorization, scope, fields))
    }
}

fn provider_error(context: &HttpContext) -> Error {
    OAuthProviderError::from_response(OAuthFailure::ProviderError, &context.response).into()
}

fn client_authentication_failed(context: &HttpContext) -> Error {
    OAuthProviderError::from_response(OAuthFailure::ClientAuthenticationFailed, &context.response)
        .into()
}

impl TokenIssuer for OAuthAuthorizationController {
    fn request_token<'a>(
        &'a self,
        authorization: &'a str,
        scope: Option<&'a str>,
        fields: Option<FormFields>,
    ) -> BoxFuture<'a, Result<OAuthToken>> {
        Box::pin(OAuthAuthorizationController::request_token(
            self,
            authorization,
            scope,
            fields,
        ))
    }
}

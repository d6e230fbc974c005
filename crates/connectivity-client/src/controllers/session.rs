//! Session endpoints

use reqwest::Method;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::base::{ApiCall, Dispatcher};
use crate::auth::GLOBAL_SCOPE;
use crate::error::{Error, RestErrorResponse, Result};
use crate::http::HttpContext;
use crate::models::{LogInRequest, LogInResponse};
use crate::server::Server;

#[derive(Clone)]
pub struct SessionController {
    dispatcher: Dispatcher,
}

impl SessionController {
    pub(crate) fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Start a service session. Requires a valid OAuth token under the
    /// `"global"` scope; a 400 maps to `Error::RestError`.
    pub async fn login(&self, body: &LogInRequest) -> Result<LogInResponse> {
        self.login_with_cancellation(body, &CancellationToken::new())
            .await
    }

    pub async fn login_with_cancellation(
        &self,
        body: &LogInRequest,
        cancel: &CancellationToken,
    ) -> Result<LogInResponse> {
        let call = ApiCall::new("session.login", Method::POST, Server::Default, "/session/login")
            .json_body(body)?
            .authenticated(GLOBAL_SCOPE)
            .error_case(400, rest_error);
        let response: LogInResponse = self.dispatcher.execute_json(call, cancel).await?;
        info!(
            username = body.username.as_deref(),
            has_session_token = response.session_token.is_some(),
            "session login succeeded"
        );
        Ok(response)
    }

    pub fn login_blocking(&self, body: &LogInRequest) -> Result<LogInResponse> {
        crate::blocking::block_on(self.login(body))
    }
}

fn rest_error(context: &HttpContext) -> Error {
    RestErrorResponse::from_response(&context.response).into()
}

//! Request dispatcher shared by every controller
//!
//! One call goes through:
//! 1. base URL resolution for the call's server alias (override first)
//! 2. request building: query/form flattening, fixed headers, call headers
//! 3. the before-request hook
//! 4. authentication for the call's scope
//! 5. the transport, raced against the caller's `CancellationToken`
//! 6. the after-response hook
//! 7. classification: endpoint error cases, then non-2xx → `Error::Api`

use std::sync::Arc;
use std::time::Instant;

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::SESSION_TOKEN_HEADER;
use crate::auth::AuthManagers;
use crate::config::ClientSettings;
use crate::error::{ApiError, Error, Result};
use crate::http::params::flatten_pairs;
use crate::http::{FormFields, HttpCallback, HttpContext, HttpRequest, HttpResponse, HttpTransport, RequestBody};
use crate::server::Server;

/// Maps a response with a specific status to an endpoint-specific error.
pub type ErrorCase = fn(&HttpContext) -> Error;

#[derive(Debug, Clone)]
enum CallBody {
    Empty,
    Json(String),
    Form(Vec<(String, Value)>),
}

/// Description of one endpoint invocation.
#[derive(Debug, Clone)]
pub struct ApiCall {
    endpoint: &'static str,
    method: Method,
    server: Server,
    path: String,
    headers: Vec<(String, String)>,
    query: Vec<(String, Value)>,
    body: CallBody,
    auth_scope: Option<&'static str>,
    error_cases: Vec<(u16, ErrorCase)>,
}

impl ApiCall {
    /// `endpoint` labels logs and metrics; `path` is appended to the
    /// server's base URL.
    pub fn new(endpoint: &'static str, method: Method, server: Server, path: impl Into<String>) -> Self {
        Self {
            endpoint,
            method,
            server,
            path: path.into(),
            headers: Vec::new(),
            query: Vec::new(),
            body: CallBody::Empty,
            auth_scope: None,
            error_cases: Vec::new(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn query_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn json_body<T: Serialize>(mut self, body: &T) -> Result<Self> {
        let json = serde_json::to_string(body)
            .map_err(|e| Error::InvalidRequest(format!("{}: cannot serialize body: {e}", self.endpoint)))?;
        self.body = CallBody::Json(json);
        Ok(self)
    }

    /// Append one form field. A JSON body set earlier is replaced.
    pub fn form_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let pair = (name.into(), value.into());
        match &mut self.body {
            CallBody::Form(fields) => fields.push(pair),
            _ => self.body = CallBody::Form(vec![pair]),
        }
        self
    }

    pub fn form_fields(self, fields: FormFields) -> Self {
        fields
            .into_iter()
            .fold(self, |call, (name, value)| call.form_field(name, value))
    }

    /// Require the auth manager registered under `scope`.
    pub fn authenticated(mut self, scope: &'static str) -> Self {
        self.auth_scope = Some(scope);
        self
    }

    /// Map responses with `status` through `case` instead of the generic
    /// `Error::Api`. First registration for a status wins.
    pub fn error_case(mut self, status: u16, case: ErrorCase) -> Self {
        self.error_cases.push((status, case));
        self
    }
}

/// Sends `ApiCall`s for one client.
#[derive(Clone)]
pub struct Dispatcher {
    settings: Arc<ClientSettings>,
    transport: Arc<dyn HttpTransport>,
    auth_managers: AuthManagers,
    callback: Option<Arc<dyn HttpCallback>>,
}

impl Dispatcher {
    pub(crate) fn new(
        settings: Arc<ClientSettings>,
        transport: Arc<dyn HttpTransport>,
        auth_managers: AuthManagers,
        callback: Option<Arc<dyn HttpCallback>>,
    ) -> Self {
        Self {
            settings,
            transport,
            auth_managers,
            callback,
        }
    }

    /// Base URL for `server` under this client's environment and overrides.
    pub fn base_uri(&self, server: Server) -> &str {
        self.settings.base_uri(server)
    }

    fn build_request(&self, call: &ApiCall) -> Result<HttpRequest> {
        let base = self.base_uri(call.server);
        debug!(server = %call.server, base, "resolved base URL");

        let mut url = Url::parse(&format!("{base}{}", call.path))
            .map_err(|e| Error::InvalidRequest(format!("{}: invalid URL: {e}", call.endpoint)))?;
        let query = flatten_pairs(&call.query, self.settings.array_serialization);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter());
        }

        let mut request = HttpRequest::new(call.method.clone(), url);
        request.body = match &call.body {
            CallBody::Empty => RequestBody::Empty,
            CallBody::Json(json) => RequestBody::Json(json.clone()),
            CallBody::Form(fields) => {
                RequestBody::Form(flatten_pairs(fields, self.settings.array_serialization))
            }
        };

        request.set_header("user-agent", &self.settings.user_agent)?;
        request.set_header("accept", "application/json")?;
        if let Some(content_type) = request.body.content_type() {
            request.set_header("content-type", content_type)?;
        }
        if !self.settings.session_token.is_empty() {
            request.set_header(SESSION_TOKEN_HEADER, self.settings.session_token.expose())?;
        }
        for (name, value) in &call.headers {
            request.set_header(name, value)?;
        }
        Ok(request)
    }

    /// Send `call` and return the exchange on success.
    #[instrument(skip_all, fields(endpoint = call.endpoint, method = %call.method))]
    pub async fn execute(&self, call: ApiCall, cancel: &CancellationToken) -> Result<HttpContext> {
        let request = self.build_request(&call)?;

        if let Some(callback) = &self.callback {
            callback.on_before_request(&request);
        }

        let request = match call.auth_scope {
            Some(scope) => {
                let manager = self
                    .auth_managers
                    .get(scope)
                    .ok_or_else(|| Error::UnknownAuthScope(scope.to_owned()))?;
                manager.apply(request).inspect_err(|e| {
                    warn!(scope, manager = manager.id(), error = %e, "authentication not applied");
                })?
            }
            None => request,
        };

        debug!(url = %request.url, "sending request");
        let started = Instant::now();
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("request cancelled");
                return Err(Error::Cancelled);
            }
            result = self.transport.execute(&request) => result?,
        };
        crate::metrics::record_request(call.endpoint, response.status, started.elapsed().as_secs_f64());
        debug!(status = response.status, "response received");

        if let Some(callback) = &self.callback {
            callback.on_after_response(&response);
        }

        let context = HttpContext { request, response };
        let status = context.response.status;
        if let Some((_, case)) = call.error_cases.iter().find(|(code, _)| *code == status) {
            let error = case(&context);
            warn!(status, error = %error, "endpoint returned an error");
            return Err(error);
        }
        validate_response(&context)?;
        Ok(context)
    }

    /// `execute` then decode the JSON body as `T`.
    pub async fn execute_json<T: DeserializeOwned>(
        &self,
        call: ApiCall,
        cancel: &CancellationToken,
    ) -> Result<T> {
        let context = self.execute(call, cancel).await?;
        deserialize(&context.response)
    }
}

fn validate_response(context: &HttpContext) -> Result<()> {
    if context.response.is_success() {
        return Ok(());
    }
    warn!(status = context.response.status, "HTTP response not OK");
    Err(ApiError::from_response(&context.response).into())
}

pub(crate) fn deserialize<T: DeserializeOwned>(response: &HttpResponse) -> Result<T> {
    serde_json::from_str(&response.body).map_err(|e| Error::Deserialize(e.to_string()))
}

//! HTTP transport seam and its reqwest implementation

use std::time::Duration;

use tracing::warn;

use super::request::HttpRequest;
use super::response::HttpResponse;
use crate::BoxFuture;
use crate::error::{Error, Result};

/// Sends one fully built request and buffers the response.
///
/// Non-2xx statuses are not errors at this layer; classification happens in
/// the dispatcher. Only transport failures (connect, timeout, body read)
/// return `Err`.
pub trait HttpTransport: Send + Sync {
    fn execute<'a>(&'a self, request: &'a HttpRequest) -> BoxFuture<'a, Result<HttpResponse>>;
}

/// Settings for the default reqwest transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpClientConfig {
    /// Whole-request timeout
    pub timeout: Duration,
    /// Overrides the default `user-agent`
    pub user_agent: Option<String>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(100),
            user_agent: None,
        }
    }
}

impl HttpClientConfig {
    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(Error::Config("http timeout must be greater than 0".into()));
        }
        if self.user_agent.as_deref().is_some_and(|a| a.trim().is_empty()) {
            return Err(Error::Config("user_agent must not be blank when set".into()));
        }
        Ok(())
    }

    pub fn user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(crate::USER_AGENT)
    }
}

/// `HttpTransport` backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: &HttpClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Wrap an already configured client (proxies, custom TLS roots).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl HttpTransport for ReqwestTransport {
    fn execute<'a>(&'a self, request: &'a HttpRequest) -> BoxFuture<'a, Result<HttpResponse>> {
        Box::pin(async move {
            let mut builder = self
                .client
                .request(request.method.clone(), request.url.as_str())
                .headers(request.headers.clone());
            if let Some(body) = request.body.encode() {
                builder = builder.body(body);
            }

            let response = builder.send().await.map_err(|e| {
                let kind = classify(&e);
                warn!(kind, url = %request.url, error = %e, "transport error");
                crate::metrics::record_transport_error(kind);
                Error::Http(format!("{kind} error: {e}"))
            })?;

            let status = response.status().as_u16();
            let headers = response.headers().clone();
            let raw_body = response.bytes().await.map_err(|e| {
                crate::metrics::record_transport_error("body");
                Error::Http(format!("failed to read response body: {e}"))
            })?;

            Ok(HttpResponse::new(status, headers, raw_body))
        })
    }
}

fn classify(error: &reqwest::Error) -> &'static str {
    if error.is_timeout() {
        "timeout"
    } else if error.is_connect() {
        "connect"
    } else {
        "request"
    }
}

//! Client configuration
//!
//! `ClientConfig` is a plain struct with public fields and a `Default`;
//! `ConnectivityClient::new` validates it and freezes the parts the
//! dispatcher needs into `ClientSettings`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use common::Secret;

use crate::auth::{AuthManagers, Credentials, OAuthToken};
use crate::error::{Error, Result};
use crate::http::{ArraySerialization, HttpCallback, HttpClientConfig, HttpTransport};
use crate::server::{Environment, Server};

/// Environment variable names read by `ClientConfig::from_env`.
pub const ENV_SESSION_TOKEN: &str = "CONNECTIVITY_SESSION_TOKEN";
pub const ENV_ENVIRONMENT: &str = "CONNECTIVITY_ENVIRONMENT";
pub const ENV_CLIENT_ID: &str = "CONNECTIVITY_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "CONNECTIVITY_CLIENT_SECRET";

/// Everything needed to build a `ConnectivityClient`.
#[derive(Clone, Default)]
pub struct ClientConfig {
    pub environment: Environment,
    /// Sent as `VZ-M2M-Token` on every call when non-empty
    pub session_token: Secret<String>,
    pub credentials: Credentials,
    /// Bootstrap token, typically carried over from a previous client
    pub token: Option<OAuthToken>,
    /// Pre-registered auth managers; `"global"` is (re)installed by the client
    pub auth_managers: AuthManagers,
    pub http: HttpClientConfig,
    pub array_serialization: ArraySerialization,
    /// Per-alias base URLs replacing the environment table entry
    pub server_overrides: BTreeMap<Server, String>,
    pub callback: Option<Arc<dyn HttpCallback>>,
    /// Replaces the default reqwest transport
    pub transport: Option<Arc<dyn HttpTransport>>,
}

impl ClientConfig {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            ..Default::default()
        }
    }

    /// Build from `CONNECTIVITY_*` environment variables.
    ///
    /// Credentials are taken only when both id and secret are set; unset
    /// variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(token) = env_var(ENV_SESSION_TOKEN) {
            config.session_token = Secret::new(token);
        }
        if let Some(environment) = env_var(ENV_ENVIRONMENT) {
            config.environment = environment.parse()?;
        }
        if let (Some(id), Some(secret)) = (env_var(ENV_CLIENT_ID), env_var(ENV_CLIENT_SECRET)) {
            config.credentials = Credentials::new(id, secret);
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (server, url) in &self.server_overrides {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(Error::Config(format!(
                    "base URL override for {server} must start with http:// or https://, got {url:?}"
                )));
            }
            url::Url::parse(url)
                .map_err(|e| Error::Config(format!("invalid base URL override for {server}: {e}")))?;
        }
        self.http.validate()
    }

    /// Base URL for `server`: override if configured, else the environment table.
    pub fn base_uri(&self, server: Server) -> &str {
        match self.server_overrides.get(&server) {
            Some(url) => url.trim_end_matches('/'),
            None => self.environment.base_uri(server),
        }
    }

    pub(crate) fn settings(&self) -> ClientSettings {
        let server_overrides = self
            .server_overrides
            .iter()
            .map(|(server, url)| (*server, url.trim_end_matches('/').to_owned()))
            .collect();
        ClientSettings {
            environment: self.environment,
            server_overrides,
            session_token: self.session_token.clone(),
            user_agent: self.http.user_agent().to_owned(),
            array_serialization: self.array_serialization,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("environment", &self.environment)
            .field("session_token", &self.session_token)
            .field("credentials", &self.credentials)
            .field("token", &self.token)
            .field("auth_managers", &self.auth_managers)
            .field("http", &self.http)
            .field("array_serialization", &self.array_serialization)
            .field("server_overrides", &self.server_overrides)
            .field("callback", &self.callback.is_some())
            .field("transport", &self.transport.is_some())
            .finish()
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Immutable per-client settings shared by every dispatcher of a client.
#[derive(Debug, Clone)]
pub(crate) struct ClientSettings {
    pub(crate) environment: Environment,
    pub(crate) server_overrides: BTreeMap<Server, String>,
    pub(crate) session_token: Secret<String>,
    pub(crate) user_agent: String,
    pub(crate) array_serialization: ArraySerialization,
}

impl ClientSettings {
    pub(crate) fn base_uri(&self, server: Server) -> &str {
        self.server_overrides
            .get(&server)
            .map(String::as_str)
            .unwrap_or_else(|| self.environment.base_uri(server))
    }
}

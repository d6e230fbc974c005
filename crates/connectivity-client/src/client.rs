//! Client facade
//!
//! A `ConnectivityClient` is immutable once built. Changing configuration
//! means `to_config()`, edit, `ConnectivityClient::new()`; the fetched token
//! survives the round trip as long as the credentials are unchanged.

use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::auth::{AuthManagers, ClientCredentialsAuthManager, GLOBAL_SCOPE, OAuthToken};
use crate::config::ClientConfig;
use crate::controllers::{Dispatcher, OAuthAuthorizationController, SessionController};
use crate::error::Result;
use crate::http::{FormFields, HttpTransport, ReqwestTransport};
use crate::server::{Environment, Server};

pub struct ConnectivityClient {
    config: ClientConfig,
    dispatcher: Dispatcher,
    auth: ClientCredentialsAuthManager,
    auth_managers: AuthManagers,
    session: OnceLock<SessionController>,
    oauth_authorization: OnceLock<OAuthAuthorizationController>,
}

impl ConnectivityClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let settings = Arc::new(config.settings());
        let transport: Arc<dyn HttpTransport> = match &config.transport {
            Some(transport) => Arc::clone(transport),
            None => Arc::new(ReqwestTransport::new(&config.http)?),
        };

        // The token endpoint authenticates with Basic credentials, so the
        // issuer's dispatcher carries no auth managers.
        let issuer = Arc::new(OAuthAuthorizationController::new(Dispatcher::new(
            Arc::clone(&settings),
            Arc::clone(&transport),
            AuthManagers::new(),
            config.callback.clone(),
        )));
        let auth = global_manager(&config, issuer);

        let mut auth_managers = config.auth_managers.clone();
        auth_managers.insert(GLOBAL_SCOPE, Arc::new(auth.clone()));

        let dispatcher = Dispatcher::new(
            settings,
            transport,
            auth_managers.clone(),
            config.callback.clone(),
        );

        debug!(
            environment = %config.environment,
            scopes = ?auth_managers.scopes(),
            has_token = auth.token().is_some(),
            "connectivity client built"
        );

        Ok(Self {
            config,
            dispatcher,
            auth,
            auth_managers,
            session: OnceLock::new(),
            oauth_authorization: OnceLock::new(),
        })
    }

    /// Build from `CONNECTIVITY_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn session(&self) -> &SessionController {
        self.session
            .get_or_init(|| SessionController::new(self.dispatcher.clone()))
    }

    pub fn oauth_authorization(&self) -> &OAuthAuthorizationController {
        self.oauth_authorization
            .get_or_init(|| OAuthAuthorizationController::new(self.dispatcher.clone()))
    }

    /// The manager registered under `"global"`.
    pub fn client_credentials_auth(&self) -> &ClientCredentialsAuthManager {
        &self.auth
    }

    pub fn auth_managers(&self) -> &AuthManagers {
        &self.auth_managers
    }

    /// Dispatcher for endpoints without a dedicated controller.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn environment(&self) -> Environment {
        self.config.environment
    }

    pub fn base_uri(&self, server: Server) -> &str {
        self.dispatcher.base_uri(server)
    }

    /// Fetch a token for the configured credentials and store it in the
    /// `"global"` auth manager.
    pub async fn fetch_token(&self) -> Result<OAuthToken> {
        self.auth.fetch_token(None).await
    }

    pub async fn fetch_token_with_fields(&self, fields: FormFields) -> Result<OAuthToken> {
        self.auth.fetch_token(Some(fields)).await
    }

    pub fn fetch_token_blocking(&self) -> Result<OAuthToken> {
        self.auth.fetch_token_blocking(None)
    }

    /// Config that rebuilds an equivalent client, including the current
    /// token and auth manager registry.
    pub fn to_config(&self) -> ClientConfig {
        let mut config = self.config.clone();
        config.token = self.auth.token();
        config.auth_managers = self.auth_managers.clone();
        config
    }
}

/// Reuse the registered `"global"` manager when it holds exactly the
/// requested credentials and token, otherwise start a fresh one.
fn global_manager(
    config: &ClientConfig,
    issuer: Arc<OAuthAuthorizationController>,
) -> ClientCredentialsAuthManager {
    let existing = config
        .auth_managers
        .get(GLOBAL_SCOPE)
        .and_then(|m| m.as_any().downcast_ref::<ClientCredentialsAuthManager>());

    match existing {
        Some(manager)
            if manager.matches(
                config.credentials.client_id(),
                config.credentials.client_secret(),
                config.token.as_ref(),
            ) =>
        {
            debug!(client_id = %config.credentials.client_id(), "reusing global auth manager");
            manager.rebind(issuer)
        }
        _ => ClientCredentialsAuthManager::new(
            config.credentials.clone(),
            config.token.clone(),
            issuer,
        ),
    }
}

impl fmt::Debug for ConnectivityClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectivityClient")
            .field("config", &self.config)
            .field("auth", &self.auth)
            .finish_non_exhaustive()
    }
}

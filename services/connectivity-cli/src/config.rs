//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! Secrets (client secret, session token, login password) are loaded from
//! env vars or `*_file` paths, never stored in the TOML directly.

use common::Secret;
use connectivity_client::{
    ClientConfig, Credentials, Environment, HttpClientConfig, LogInRequest, Server,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CLIENT_SECRET_ENV: &str = "CONNECTIVITY_CLIENT_SECRET";
pub const SESSION_TOKEN_ENV: &str = "CONNECTIVITY_SESSION_TOKEN";
pub const LOGIN_PASSWORD_ENV: &str = "CONNECTIVITY_LOGIN_PASSWORD";

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub client: ClientSection,
    pub credentials: CredentialsSection,
    #[serde(default)]
    pub http: HttpSection,
    #[serde(default)]
    pub login: Option<LoginSection>,
}

/// Target environment and optional base URL overrides
#[derive(Debug, Default, Deserialize)]
pub struct ClientSection {
    #[serde(default)]
    pub environment: Environment,
    /// Replaces the business API base URL (e.g. a private deployment)
    #[serde(default)]
    pub base_url: Option<String>,
    /// Replaces the OAuth token server base URL
    #[serde(default)]
    pub oauth_base_url: Option<String>,
    #[serde(skip)]
    pub session_token: Option<Secret<String>>,
    /// Path to a file containing the M2M session token
    #[serde(default)]
    pub session_token_file: Option<PathBuf>,
}

/// OAuth client credentials
#[derive(Debug, Deserialize)]
pub struct CredentialsSection {
    pub client_id: String,
    #[serde(skip)]
    pub client_secret: Option<Secret<String>>,
    /// Path to a file containing the client secret
    #[serde(default)]
    pub client_secret_file: Option<PathBuf>,
}

/// HTTP client settings
#[derive(Debug, Deserialize)]
pub struct HttpSection {
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            user_agent: None,
        }
    }
}

/// Session login performed after the token is acquired
#[derive(Debug, Deserialize)]
pub struct LoginSection {
    pub username: String,
    #[serde(skip)]
    pub password: Option<Secret<String>>,
    /// Path to a file containing the login password
    #[serde(default)]
    pub password_file: Option<PathBuf>,
}

fn default_timeout() -> u64 {
    100
}

impl Config {
    /// Load configuration from a TOML file, then resolve secrets.
    ///
    /// Each secret resolves from its env var first, then its `*_file` path.
    /// The client secret is required; the others are optional.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;
        config.validate()?;

        config.credentials.client_secret = resolve_secret(
            CLIENT_SECRET_ENV,
            config.credentials.client_secret_file.as_deref(),
        )?;
        if config.credentials.client_secret.is_none() {
            return Err(common::Error::Config(format!(
                "client secret missing: set {CLIENT_SECRET_ENV} or credentials.client_secret_file"
            )));
        }

        config.client.session_token = resolve_secret(
            SESSION_TOKEN_ENV,
            config.client.session_token_file.as_deref(),
        )?;

        if let Some(login) = config.login.as_mut() {
            login.password = resolve_secret(LOGIN_PASSWORD_ENV, login.password_file.as_deref())?;
        }

        Ok(config)
    }

    fn validate(&self) -> common::Result<()> {
        if self.credentials.client_id.trim().is_empty() {
            return Err(common::Error::Config(
                "credentials.client_id must not be empty".into(),
            ));
        }

        for (name, url) in [
            ("client.base_url", &self.client.base_url),
            ("client.oauth_base_url", &self.client.oauth_base_url),
        ] {
            if let Some(url) = url
                .as_deref()
                .filter(|u| !u.starts_with("http://") && !u.starts_with("https://"))
            {
                return Err(common::Error::Config(format!(
                    "{name} must start with http:// or https://, got: {url}"
                )));
            }
        }

        if self.http.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Library configuration for this file.
    pub fn client_config(&self) -> ClientConfig {
        let mut server_overrides = BTreeMap::new();
        if let Some(url) = &self.client.base_url {
            server_overrides.insert(Server::Default, url.clone());
        }
        if let Some(url) = &self.client.oauth_base_url {
            server_overrides.insert(Server::OAuthServer, url.clone());
        }

        let client_secret = self.credentials.client_secret.clone().unwrap_or_default();

        ClientConfig {
            environment: self.client.environment,
            session_token: self.client.session_token.clone().unwrap_or_default(),
            credentials: Credentials::new(self.credentials.client_id.clone(), client_secret),
            http: HttpClientConfig {
                timeout: Duration::from_secs(self.http.timeout_secs),
                user_agent: self.http.user_agent.clone(),
            },
            server_overrides,
            ..Default::default()
        }
    }

    /// Login body, if a `[login]` section is configured.
    pub fn login_request(&self) -> Option<LogInRequest> {
        self.login.as_ref().map(|login| LogInRequest {
            username: Some(login.username.clone()),
            password: login.password.as_ref().map(|p| p.expose().clone()),
        })
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("connectivity.toml")
    }
}

/// Env var wins over file; blank values count as unset.
fn resolve_secret(env: &str, file: Option<&Path>) -> common::Result<Option<Secret<String>>> {
    if let Ok(value) = std::env::var(env) {
        if !value.trim().is_empty() {
            return Ok(Some(Secret::new(value)));
        }
    }
    let Some(path) = file else {
        return Ok(None);
    };
    let value = std::fs::read_to_string(path).map_err(|e| {
        common::Error::Config(format!("failed to read {}: {e}", path.display()))
    })?;
    let value = value.trim().to_owned();
    Ok((!value.is_empty()).then(|| Secret::new(value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mutex to serialize tests that mutate environment variables, preventing
    /// data races when tests run in parallel.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// SAFETY: Callers must hold ENV_MUTEX to prevent concurrent env mutation.
    unsafe fn set_env(key: &str, val: &str) {
        unsafe { std::env::set_var(key, val) };
    }

    unsafe fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) };
    }

    fn clear_secret_env() {
        unsafe {
            remove_env(CLIENT_SECRET_ENV);
            remove_env(SESSION_TOKEN_ENV);
            remove_env(LOGIN_PASSWORD_ENV);
        }
    }

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn minimal_toml() -> &'static str {
        r#"
[credentials]
client_id = "fleet-client"
"#
    }

    #[test]
    fn test_load_minimal_config_with_env_secret() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "connectivity.toml", minimal_toml());

        clear_secret_env();
        unsafe { set_env(CLIENT_SECRET_ENV, "env-secret") };
        let config = Config::load(&path).unwrap();
        clear_secret_env();

        assert_eq!(config.client.environment, Environment::Production);
        assert_eq!(config.http.timeout_secs, 100);
        assert!(config.login.is_none());
        assert!(config.client.session_token.is_none());
        assert_eq!(
            config.credentials.client_secret.as_ref().unwrap().expose(),
            "env-secret"
        );
    }

    #[test]
    fn test_full_config_from_files() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let secret = write(dir.path(), "client_secret", "file-secret\n");
        let session = write(dir.path(), "session_token", "m2m-from-file");
        let password = write(dir.path(), "password", "IMgr8\n");

        let toml_content = format!(
            r#"
[client]
environment = "staging"
base_url = "http://127.0.0.1:9000/api/m2m/v1"
oauth_base_url = "http://127.0.0.1:9000/api/ts/v1"
session_token_file = "{}"

[credentials]
client_id = "fleet-client"
client_secret_file = "{}"

[http]
timeout_secs = 15
user_agent = "fleet-tool/1.0"

[login]
username = "zbeeblebrox"
password_file = "{}"
"#,
            session.display(),
            secret.display(),
            password.display()
        );
        let path = write(dir.path(), "connectivity.toml", &toml_content);

        clear_secret_env();
        let config = Config::load(&path).unwrap();

        assert_eq!(config.client.environment, Environment::Staging);
        assert_eq!(
            config.credentials.client_secret.as_ref().unwrap().expose(),
            "file-secret"
        );
        assert_eq!(
            config.client.session_token.as_ref().unwrap().expose(),
            "m2m-from-file"
        );

        let login = config.login_request().unwrap();
        assert_eq!(login, LogInRequest::new("zbeeblebrox", "IMgr8"));

        let client_config = config.client_config();
        assert_eq!(client_config.environment, Environment::Staging);
        assert_eq!(client_config.session_token.expose(), "m2m-from-file");
        assert_eq!(
            client_config.credentials,
            Credentials::new("fleet-client", "file-secret")
        );
        assert_eq!(client_config.http.timeout, Duration::from_secs(15));
        assert_eq!(client_config.http.user_agent.as_deref(), Some("fleet-tool/1.0"));
        assert_eq!(
            client_config.base_uri(Server::Default),
            "http://127.0.0.1:9000/api/m2m/v1"
        );
        assert_eq!(
            client_config.base_uri(Server::OAuthServer),
            "http://127.0.0.1:9000/api/ts/v1"
        );
        assert!(client_config.validate().is_ok());
    }

    #[test]
    fn test_env_secret_overrides_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let secret = write(dir.path(), "client_secret", "file-secret");
        let toml_content = format!(
            r#"
[credentials]
client_id = "fleet-client"
client_secret_file = "{}"
"#,
            secret.display()
        );
        let path = write(dir.path(), "connectivity.toml", &toml_content);

        clear_secret_env();
        unsafe { set_env(CLIENT_SECRET_ENV, "env-secret") };
        let config = Config::load(&path).unwrap();
        clear_secret_env();

        assert_eq!(
            config.credentials.client_secret.as_ref().unwrap().expose(),
            "env-secret"
        );
    }

    #[test]
    fn test_missing_client_secret_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "connectivity.toml", minimal_toml());

        clear_secret_env();
        let err = Config::load(&path).unwrap_err().to_string();
        assert!(err.contains(CLIENT_SECRET_ENV), "got: {err}");
    }

    #[test]
    fn test_blank_secret_file_counts_as_missing() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let secret = write(dir.path(), "client_secret", "  \n  ");
        let toml_content = format!(
            r#"
[credentials]
client_id = "fleet-client"
client_secret_file = "{}"
"#,
            secret.display()
        );
        let path = write(dir.path(), "connectivity.toml", &toml_content);

        clear_secret_env();
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_unreadable_secret_file_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let toml_content = r#"
[credentials]
client_id = "fleet-client"
client_secret_file = "/nonexistent/client_secret"
"#;
        let path = write(dir.path(), "connectivity.toml", toml_content);

        clear_secret_env();
        let err = Config::load(&path).unwrap_err().to_string();
        assert!(err.contains("failed to read"), "got: {err}");
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("/nonexistent/path/connectivity.toml"));
        assert!(matches!(result, Err(common::Error::Io(_))));
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "bad.toml", "not valid {{{{ toml");
        assert!(matches!(Config::load(&path), Err(common::Error::Toml(_))));
    }

    #[test]
    fn test_unknown_environment_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "connectivity.toml",
            r#"
[client]
environment = "qa"

[credentials]
client_id = "fleet-client"
"#,
        );
        assert!(matches!(Config::load(&path), Err(common::Error::Toml(_))));
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "connectivity.toml",
            r#"
[client]
oauth_base_url = "thingspace.verizon.com/api/ts/v1"

[credentials]
client_id = "fleet-client"
"#,
        );
        let err = Config::load(&path).unwrap_err().to_string();
        assert!(
            err.contains("client.oauth_base_url must start with http"),
            "got: {err}"
        );
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "connectivity.toml",
            r#"
[credentials]
client_id = "fleet-client"

[http]
timeout_secs = 0
"#,
        );
        let err = Config::load(&path).unwrap_err().to_string();
        assert!(err.contains("timeout_secs must be greater than 0"), "got: {err}");
    }

    #[test]
    fn test_empty_client_id_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "connectivity.toml",
            r#"
[credentials]
client_id = "  "
"#,
        );
        let err = Config::load(&path).unwrap_err().to_string();
        assert!(err.contains("client_id must not be empty"), "got: {err}");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "connectivity.toml", minimal_toml());

        clear_secret_env();
        unsafe { set_env(CLIENT_SECRET_ENV, "do-not-print-me") };
        let config = Config::load(&path).unwrap();
        clear_secret_env();

        let debug = format!("{config:?}");
        assert!(!debug.contains("do-not-print-me"), "got: {debug}");
    }

    #[test]
    fn test_resolve_path_cli_arg() {
        let path = Config::resolve_path(Some("/custom/path.toml"));
        assert_eq!(path, PathBuf::from("/custom/path.toml"));
    }

    #[test]
    fn test_resolve_path_env_var() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { set_env("CONFIG_PATH", "/env/path.toml") };
        let path = Config::resolve_path(None);
        assert_eq!(path, PathBuf::from("/env/path.toml"));
        unsafe { remove_env("CONFIG_PATH") };
    }

    #[test]
    fn test_resolve_path_default() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env("CONFIG_PATH") };
        let path = Config::resolve_path(None);
        assert_eq!(path, PathBuf::from("connectivity.toml"));
    }

    #[test]
    fn test_resolve_path_cli_overrides_env() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { set_env("CONFIG_PATH", "/env/should-lose.toml") };
        let path = Config::resolve_path(Some("/cli/wins.toml"));
        assert_eq!(
            path,
            PathBuf::from("/cli/wins.toml"),
            "CLI arg must take precedence over CONFIG_PATH env var"
        );
        unsafe { remove_env("CONFIG_PATH") };
    }
}

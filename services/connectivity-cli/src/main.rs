//! Connectivity login tool
//!
//! Bootstrap binary over `connectivity-client`:
//! 1. Loads TOML config (secrets from env vars or files)
//! 2. Fetches an OAuth token with the client-credentials grant
//! 3. Optionally logs in to start a service session
//! 4. Prints the login response as JSON on stdout

mod config;

use anyhow::{Context, Result};
use connectivity_client::{ConnectivityClient, LogInResponse};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
        .init();

    info!("starting connectivity-login");

    // CLI: simple --config flag parsing
    let args: Vec<String> = std::env::args().collect();
    let cli_config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let config_path = Config::resolve_path(cli_config_path);
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    info!(
        environment = %config.client.environment,
        client_id = %config.credentials.client_id,
        login = config.login.is_some(),
        "configuration loaded"
    );

    if let Some(response) = run(&config).await? {
        println!(
            "{}",
            serde_json::to_string_pretty(&response).context("failed to encode login response")?
        );
    }
    Ok(())
}

/// Fetch a token, then log in when a `[login]` section is present.
async fn run(config: &Config) -> Result<Option<LogInResponse>> {
    let client =
        ConnectivityClient::new(config.client_config()).context("failed to build client")?;

    let token = client
        .fetch_token()
        .await
        .context("failed to fetch OAuth token")?;
    info!(
        token_type = token.token_type.as_deref(),
        expires_in = token.expires_in,
        "OAuth token acquired"
    );

    let Some(login) = config.login_request() else {
        info!("no [login] section configured, stopping after token fetch");
        return Ok(None);
    };

    let response = client
        .session()
        .login(&login)
        .await
        .context("session login failed")?;
    Ok(Some(response))
}

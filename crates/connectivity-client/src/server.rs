//! Deployment environments and logical server aliases
//!
//! Every (environment, alias) pair maps to a fixed base URL. The table is a
//! compile-time constant; per-client overrides live in `ClientConfig`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Deployment environment of the remote service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Staging,
}

/// Logical server alias. Business endpoints use `Default`; the token
/// endpoint lives on `OAuthServer`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Server {
    #[default]
    Default,
    #[serde(alias = "oauth")]
    OAuthServer,
}

impl Environment {
    /// Base URL of `server` in this environment.
    pub const fn base_uri(self, server: Server) -> &'static str {
        match (self, server) {
            (Environment::Production, Server::Default) => "https://thingspace.verizon.com/api/m2m/v1",
            (Environment::Production, Server::OAuthServer) => {
                "https://thingspace.verizon.com/api/ts/v1"
            }
            (Environment::Staging, Server::Default) => {
                "https://staging.thingspace.verizon.com/api/m2m/v1"
            }
            (Environment::Staging, Server::OAuthServer) => {
                "https://staging.thingspace.verizon.com/api/ts/v1"
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Production => "production",
            Environment::Staging => "staging",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = Error;

    /// Case-insensitive, so `Production` and `production` both parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" => Ok(Environment::Production),
            "staging" => Ok(Environment::Staging),
            other => Err(Error::Config(format!(
                "unknown environment {other:?} (expected production or staging)"
            ))),
        }
    }
}

impl Server {
    /// Label used in logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            Server::Default => "default",
            Server::OAuthServer => "oauth_server",
        }
    }
}

impl fmt::Display for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

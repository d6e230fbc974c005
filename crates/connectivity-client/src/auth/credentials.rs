//! OAuth client credentials

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use common::Secret;

/// Client id and secret for the client-credentials grant.
#[derive(Clone, Default)]
pub struct Credentials {
    client_id: String,
    client_secret: Secret<String>,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<Secret<String>>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &str {
        self.client_secret.expose()
    }

    /// Exact, case-sensitive comparison of both fields.
    pub fn matches(&self, client_id: &str, client_secret: &str) -> bool {
        self.client_id == client_id && self.client_secret.expose() == client_secret
    }

    /// `Authorization` value for the token endpoint:
    /// `Basic base64(client_id:client_secret)`.
    pub fn basic_authorization(&self) -> String {
        let pair = format!("{}:{}", self.client_id, self.client_secret.expose());
        format!("Basic {}", STANDARD.encode(pair))
    }
}

impl PartialEq for Credentials {
    fn eq(&self, other: &Self) -> bool {
        self.matches(&other.client_id, other.client_secret.expose())
    }
}

impl Eq for Credentials {}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret)
            .finish()
    }
}

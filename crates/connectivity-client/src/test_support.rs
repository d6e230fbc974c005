//! Local stand-ins for the remote service, shared by unit tests.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{MethodRouter, post};
use tokio::net::TcpListener;

use crate::auth::Credentials;
use crate::config::ClientConfig;
use crate::server::Server;

pub(crate) const SESSION_TOKEN: &str = "bcce3ea6-fe4f-4952-bacf-eadd80718e83";
pub(crate) const ACCESS_TOKEN: &str = "test-access-token";

/// Serializes tests that mutate process environment variables.
pub(crate) static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Serve `app` on an ephemeral localhost port; returns `http://addr`.
pub(crate) async fn spawn_server(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Base URL overrides pointing both server aliases at a mock.
pub(crate) fn overrides(base: &str) -> BTreeMap<Server, String> {
    BTreeMap::from([
        (Server::Default, format!("{base}/api/m2m/v1")),
        (Server::OAuthServer, format!("{base}/api/ts/v1")),
    ])
}

pub(crate) fn test_config(base: &str) -> ClientConfig {
    ClientConfig {
        credentials: Credentials::new("client-id", "client-secret"),
        server_overrides: overrides(base),
        ..Default::default()
    }
}

/// One request as seen by the mock.
#[derive(Debug, Clone)]
pub(crate) struct Captured {
    pub endpoint: &'static str,
    pub headers: HeaderMap,
    pub body: String,
}

impl Captured {
    pub(crate) fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Decoded form body pairs.
    pub(crate) fn form(&self) -> Vec<(String, String)> {
        url::form_urlencoded::parse(self.body.as_bytes())
            .into_owned()
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Captures(Arc<Mutex<Vec<Captured>>>);

impl Captures {
    fn push(&self, captured: Captured) {
        self.0.lock().unwrap().push(captured);
    }

    pub(crate) fn all(&self) -> Vec<Captured> {
        self.0.lock().unwrap().clone()
    }

    pub(crate) fn last(&self, endpoint: &str) -> Option<Captured> {
        self.all().into_iter().rev().find(|c| c.endpoint == endpoint)
    }

    pub(crate) fn count(&self, endpoint: &str) -> usize {
        self.all().iter().filter(|c| c.endpoint == endpoint).count()
    }
}

/// Canned behavior for the token and login endpoints.
#[derive(Debug, Clone)]
pub(crate) struct MockService {
    pub token_status: u16,
    pub token_body: String,
    pub login_status: u16,
    pub login_body: String,
    pub login_delay: Duration,
}

impl Default for MockService {
    fn default() -> Self {
        Self {
            token_status: 200,
            token_body: format!(
                r#"{{"access_token":"{ACCESS_TOKEN}","token_type":"Bearer","expires_in":3600}}"#
            ),
            login_status: 200,
            login_body: format!(r#"{{"sessionToken":"{SESSION_TOKEN}"}}"#),
            login_delay: Duration::ZERO,
        }
    }
}

impl MockService {
    pub(crate) async fn spawn(self) -> (String, Captures) {
        let captures = Captures::default();
        let app = Router::new()
            .route(
                "/api/ts/v1/oauth2/token",
                endpoint("token", self.token_status, self.token_body, Duration::ZERO, captures.clone()),
            )
            .route(
                "/api/m2m/v1/session/login",
                endpoint("login", self.login_status, self.login_body, self.login_delay, captures.clone()),
            );
        (spawn_server(app).await, captures)
    }
}

fn endpoint(
    name: &'static str,
    status: u16,
    body: String,
    delay: Duration,
    captures: Captures,
) -> MethodRouter {
    post(move |headers: HeaderMap, payload: String| {
        let captures = captures.clone();
        let body = body.clone();
        async move {
            captures.push(Captured {
                endpoint: name,
                headers,
                body: payload,
            });
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            (
                StatusCode::from_u16(status).unwrap(),
                [(CONTENT_TYPE, "application/json")],
                body,
            )
        }
    })
}

//! Endpoint controllers and the dispatcher they share

pub mod base;
pub mod oauth_authorization;
pub mod session;

pub use base::{ApiCall, Dispatcher, ErrorCase};
pub use oauth_authorization::OAuthAuthorizationController;
pub use session::SessionController;

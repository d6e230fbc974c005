//! Shared types for the connectivity client workspace
//!
//! `Secret` keeps client secrets, session tokens and passwords out of logs.
//! `Error` covers configuration loading for binaries built on the client.

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;

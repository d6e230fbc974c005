//! Request and response bodies of business endpoints

pub mod session;

pub use session::{LogInRequest, LogInResponse};

//! Observation hooks around each HTTP exchange

use std::sync::{Mutex, PoisonError};

use super::request::HttpRequest;
use super::response::HttpResponse;

/// Called before a request is authenticated and sent, and after its
/// response arrives. Hooks observe only; they cannot alter the exchange.
pub trait HttpCallback: Send + Sync {
    fn on_before_request(&self, _request: &HttpRequest) {}
    fn on_after_response(&self, _response: &HttpResponse) {}
}

/// Callback that keeps the most recent request and response.
#[derive(Debug, Default)]
pub struct ResponseRecorder {
    request: Mutex<Option<HttpRequest>>,
    response: Mutex<Option<HttpResponse>>,
}

impl ResponseRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        self.request
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_response(&self) -> Option<HttpResponse> {
        self.response
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl HttpCallback for ResponseRecorder {
    fn on_before_request(&self, request: &HttpRequest) {
        *self.request.lock().unwrap_or_else(PoisonError::into_inner) = Some(request.clone());
    }

    fn on_after_response(&self, response: &HttpResponse) {
        *self.response.lock().unwrap_or_else(PoisonError::into_inner) = Some(response.clone());
    }
}

//! Received response and the request/response pair seen by error mappings.

use bytes::Bytes;
use reqwest::header::HeaderMap;

use super::request::HttpRequest;

/// HTTP response with the body buffered both raw and as text.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub raw_body: Bytes,
    /// Lossy UTF-8 view of `raw_body`
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, headers: HeaderMap, raw_body: Bytes) -> Self {
        let body = String::from_utf8_lossy(&raw_body).into_owned();
        Self {
            status,
            headers,
            raw_body,
            body,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// A sent request together with the response it produced.
#[derive(Debug, Clone)]
pub struct HttpContext {
    pub request: HttpRequest,
    pub response: HttpResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_range_is_2xx() {
        let ok = HttpResponse::new(204, HeaderMap::new(), Bytes::new());
        assert!(ok.is_success());
        let redirect = HttpResponse::new(302, HeaderMap::new(), Bytes::new());
        assert!(!redirect.is_success());
        let client_err = HttpResponse::new(400, HeaderMap::new(), Bytes::new());
        assert!(!client_err.is_success());
    }

    #[test]
    fn body_text_is_lossy_utf8() {
        let response = HttpResponse::new(
            200,
            HeaderMap::new(),
            Bytes::from_static(b"ok \xff"),
        );
        assert_eq!(response.raw_body.len(), 4);
        assert!(response.body.starts_with("ok "));
    }
}

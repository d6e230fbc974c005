//! HTTP plumbing: request/response values, parameter encoding, the pluggable
//! transport and observation hooks.

pub mod callback;
pub mod params;
pub mod request;
pub mod response;
pub mod transport;

pub use callback::{HttpCallback, ResponseRecorder};
pub use params::{ArraySerialization, FormFields};
pub use request::{HttpRequest, RequestBody};
pub use response::{HttpContext, HttpResponse};
pub use transport::{HttpClientConfig, HttpTransport, ReqwestTransport};

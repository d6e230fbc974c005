//! Synchronous adapter over the async operations
//!
//! Blocking forms drive the same future the async form returns, on a
//! process-wide single-worker runtime. Calling one from inside a tokio
//! runtime would deadlock or panic, so it fails fast with
//! `Error::BlockingInAsyncContext` instead.

use std::future::Future;
use std::sync::OnceLock;

use tokio::runtime::{Builder, Handle, Runtime};

use crate::error::{Error, Result};

static RUNTIME: OnceLock<Runtime> = OnceLock::new();

fn runtime() -> Result<&'static Runtime> {
    if let Some(rt) = RUNTIME.get() {
        return Ok(rt);
    }
    let rt = Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("connectivity-blocking")
        .enable_all()
        .build()
        .map_err(|e| Error::Config(format!("failed to start blocking runtime: {e}")))?;
    // A concurrent caller may have won the race; its runtime is kept and ours dropped.
    let _ = RUNTIME.set(rt);
    RUNTIME
        .get()
        .ok_or_else(|| Error::Config("blocking runtime unavailable".into()))
}

/// Run `future` to completion on the shared blocking runtime.
pub fn block_on<F, T>(future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    if Handle::try_current().is_ok() {
        return Err(Error::BlockingInAsyncContext);
    }
    runtime()?.block_on(future)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_future_outside_runtime() {
        let value = block_on(async { Ok::<_, Error>(41 + 1) }).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn propagates_errors() {
        let err = block_on(async { Err::<(), _>(Error::Cancelled) }).unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }

    #[tokio::test]
    async fn refuses_inside_async_runtime() {
        let err = block_on(async { Ok::<_, Error>(()) }).unwrap_err();
        assert!(matches!(err, Error::BlockingInAsyncContext));
    }
}

//! Per-call capture state shared between the logging middlewares
//!
//! The call-logging middleware creates one [`CallLog`] per request and inserts it
//! into the request extensions. The body logger and the status pages write into it,
//! and the call-logging middleware reads it back once the response is ready.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::convert::Infallible;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Captured bodies of one call, already rendered and redacted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallLogState {
    pub request_body: Option<String>,
    pub response_body: Option<String>,
}

/// Handle to the capture state of the current call
///
/// Cloning shares the state. A handler can also take `CallLog` as an extractor to
/// overwrite the response body for paths that bypass the envelope types.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<CallLogState>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, CallLogState> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_request_body(&self, body: impl Into<String>) {
        self.state().request_body = Some(body.into());
    }

    pub fn set_response_body(&self, body: impl Into<String>) {
        self.state().response_body = Some(body.into());
    }

    pub fn request_body(&self) -> Option<String> {
        self.state().request_body.clone()
    }

    pub fn response_body(&self) -> Option<String> {
        self.state().response_body.clone()
    }

    /// Move the captured state out, leaving it empty
    pub fn take(&self) -> CallLogState {
        std::mem::take(&mut *self.state())
    }
}

/// Yields the call's log, or a detached one outside a logged scope
impl<S> FromRequestParts<S> for CallLog
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<CallLog>().cloned().unwrap_or_default())
    }
}

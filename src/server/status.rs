//! Status pages: JSON envelopes for responses that carry none
//!
//! - `404` without an envelope (unknown route) becomes "Route not found"
//! - `401` without an envelope becomes "Unauthorized"
//! - a panicking handler becomes a `500` carrying the panic message
//!
//! Error envelopes are also recorded into the call's [`CallLog`] when no inner
//! layer captured a response body.

use crate::core::error::WebError;
use crate::core::response::{LoggedBody, Response as Envelope};
use crate::server::logging::CallLog;
use axum::extract::Request;
use axum::http::{StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::any::Any;

/// Status-page middleware, installed with `middleware::from_fn`
pub async fn status_pages(req: Request, next: Next) -> Response {
    let call_log = req.extensions().get::<CallLog>().cloned();
    let response = next.run(req).await;

    let response = match response.status() {
        StatusCode::NOT_FOUND if !has_envelope(&response) => {
            replace_body(response, "Route not found")
        }
        StatusCode::UNAUTHORIZED if !has_envelope(&response) => {
            replace_body(response, "Unauthorized")
        }
        _ => response,
    };

    if let Some(call_log) = call_log {
        record_error(&call_log, &response);
    }
    response
}

fn has_envelope(response: &Response) -> bool {
    response.extensions().get::<LoggedBody>().is_some()
}

/// Swap in an envelope, keeping headers such as `WWW-Authenticate`
fn replace_body(original: Response, message: &str) -> Response {
    let status = original.status();
    let (parts, _) = original.into_parts();

    let mut response = Envelope::<()>::new(status, message, None).into_response();
    for (name, value) in parts.headers.iter() {
        if name != header::CONTENT_TYPE && name != header::CONTENT_LENGTH {
            response.headers_mut().append(name.clone(), value.clone());
        }
    }
    response
}

fn record_error(call_log: &CallLog, response: &Response) {
    let is_error = response.status().is_client_error() || response.status().is_server_error();
    if !is_error || call_log.response_body().is_some() {
        return;
    }
    if let Some(logged) = response.extensions().get::<LoggedBody>() {
        match logged.render() {
            Ok(body) => call_log.set_response_body(body),
            Err(err) => tracing::warn!(error = %err, "failed to render error envelope for logging"),
        }
    }
}

/// Panic handler for `tower_http::catch_panic::CatchPanicLayer::custom`
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(text) = panic.downcast_ref::<String>() {
        text.clone()
    } else if let Some(text) = panic.downcast_ref::<&str>() {
        text.to_string()
    } else {
        "Internal Server Error".to_string()
    };

    tracing::error!(panic = %message, "handler panicked");
    WebError::Unclassified(message).into_response()
}

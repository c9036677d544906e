//! Request/response body capture
//!
//! Route-scoped middleware that records the inbound body and the outbound envelope
//! into the current [`CallLog`]. Capture never fails a request: whenever the body
//! cannot be captured safely it is passed downstream untouched and the capture is
//! left absent.

use super::call_log::CallLog;
use super::redact::Redactor;
use crate::config::LoggingConfig;
use crate::core::LoggedBody;
use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;
use futures::{StreamExt, stream};
use std::sync::Arc;

/// Settings for [`body_logger`]
#[derive(Debug, Clone)]
pub struct BodyLogger {
    redactor: Arc<Redactor>,
    limit: usize,
    skip_content_types: Arc<Vec<String>>,
    pretty_json: bool,
}

impl BodyLogger {
    pub fn new(config: &LoggingConfig) -> Self {
        Self {
            redactor: Arc::new(Redactor::new(&config.secret_fields)),
            limit: config.body_limit,
            skip_content_types: Arc::new(config.skip_content_types.clone()),
            pretty_json: config.pretty_json,
        }
    }

    /// Whether a body with these headers should be buffered at all
    fn captures(&self, headers: &HeaderMap) -> bool {
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        !self
            .skip_content_types
            .iter()
            .any(|prefix| content_type.starts_with(&prefix.to_ascii_lowercase()))
    }

    fn render(&self, logged: &LoggedBody) -> serde_json::Result<String> {
        let compact = logged.render()?;
        if self.pretty_json {
            let value: serde_json::Value = serde_json::from_str(&compact)?;
            serde_json::to_string_pretty(&value)
        } else {
            Ok(compact)
        }
    }

    /// Buffer the request body up to the limit and hand back an equivalent request
    async fn capture_request(&self, call_log: &CallLog, req: Request) -> Request {
        let (parts, body) = req.into_parts();
        let mut data = body.into_data_stream();
        let mut buffered: Vec<Bytes> = Vec::new();
        let mut size = 0usize;

        while let Some(chunk) = data.next().await {
            match chunk {
                Ok(chunk) => {
                    size += chunk.len();
                    buffered.push(chunk);
                    if size > self.limit {
                        tracing::debug!(limit = self.limit, "request body over capture limit, not logged");
                        let replay = stream::iter(buffered.into_iter().map(Ok)).chain(data);
                        return Request::from_parts(parts, Body::from_stream(replay));
                    }
                }
                Err(err) => {
                    tracing::debug!(error = %err, "request body stream failed, not logged");
                    let replay = stream::iter(buffered.into_iter().map(Ok))
                        .chain(stream::once(async move { Err(err) }))
                        .chain(data);
                    return Request::from_parts(parts, Body::from_stream(replay));
                }
            }
        }

        let bytes = Bytes::from(buffered.concat());
        if !bytes.is_empty() {
            match std::str::from_utf8(&bytes) {
                Ok(text) => call_log.set_request_body(self.redactor.redact(text)),
                Err(_) => tracing::debug!("request body is not UTF-8, not logged"),
            }
        }
        Request::from_parts(parts, Body::from(bytes))
    }
}

impl Default for BodyLogger {
    fn default() -> Self {
        Self::new(&LoggingConfig::default())
    }
}

/// Capture middleware, installed with `middleware::from_fn_with_state`
///
/// Does nothing outside a call-logging scope, since no [`CallLog`] exists to
/// receive the capture.
pub async fn body_logger(State(logger): State<BodyLogger>, req: Request, next: Next) -> Response {
    let Some(call_log) = req.extensions().get::<CallLog>().cloned() else {
        return next.run(req).await;
    };

    let req = if logger.captures(req.headers()) {
        logger.capture_request(&call_log, req).await
    } else {
        req
    };

    let response = next.run(req).await;

    if let Some(logged) = response.extensions().get::<LoggedBody>() {
        match logger.render(logged) {
            Ok(body) => call_log.set_response_body(body),
            Err(err) => tracing::warn!(error = %err, "failed to render response body for logging"),
        }
    }

    response
}

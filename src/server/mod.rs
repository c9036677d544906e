//! Server glue around an application router
//!
//! This module provides a `WebServerBuilder` that wraps application routes with:
//! - CORS defaults
//! - `X-Request-ID` correlation ids
//! - structured call logging with body capture and redaction
//! - JSON status pages and panic recovery

pub mod builder;
pub mod call_id;
pub mod cors;
pub mod logging;
pub mod network;
pub mod status;

pub use builder::WebServerBuilder;
pub use call_id::{CallId, X_REQUEST_ID, call_id};
pub use cors::cors_layer;
pub use logging::{init_tracing, subscriber};
pub use network::{await_service, is_tcp_port_available};
pub use status::{handle_panic, status_pages};

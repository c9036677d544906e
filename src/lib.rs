//! # web-utils
//!
//! Reusable building blocks for JSON services on axum.
//!
//! ## Features
//!
//! - **Response Envelopes**: `Response<T>`, `ResponseList<T>` and `ErrorResponse` with `totalCount`
//! - **Typed Errors**: `WebError` maps to a status code and an envelope
//! - **Declarative Validation**: rules declared once per type, flat or recursive checking
//! - **Call Logging**: one structured line per call, with redacted headers, query and bodies
//! - **Secret Fields**: `Secret<T>` serializes normally but is masked in logs
//! - **Server Glue**: CORS, `X-Request-ID`, status pages and graceful shutdown
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use web_utils::prelude::*;
//!
//! #[derive(Deserialize)]
//! struct SignUp {
//!     email: String,
//!     password: Secret<String>,
//! }
//!
//! impl Validatable for SignUp {
//!     fn constraints() -> Result<Constraints<Self>, ConstraintError> {
//!         Constraints::builder()
//!             .field("email", |s: &Self| s.email.as_str().into())
//!             .rule(NotBlank::new())
//!             .rule(StrictEmail::new()?)
//!             .build()
//!     }
//! }
//!
//! async fn sign_up(ValidatedJson(payload): ValidatedJson<SignUp>) -> WebResult<Response<String>> {
//!     Ok(Response::ok(payload.email))
//! }
//!
//! let app = WebServerBuilder::new(WebConfig::default())
//!     .with_logged_routes(Router::new().route("/sign-up", post(sign_up)))
//!     .build();
//! ```

pub mod config;
pub mod core;
pub mod server;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Envelopes and Errors ===
    pub use crate::core::{
        ErrorDetail, ErrorResponse, Loggable, LoggedJson, Response, ResponseList, WebError,
        WebResult,
    };

    // === Validation ===
    pub use crate::core::field::FieldValue;
    pub use crate::core::validation::{
        ConstraintError, Constraints, DateFormat, Email, FieldMatch, InIntSet, InStringSet,
        IntValueList, JsonBody, Max, Min, Nested, NoNullElements, NotBlank, NotNull, Pattern,
        Request as ValidatableRequest, Size, StrictEmail, StringValueList, Validatable,
        ValidatedJson, Validator, ViolationSet,
    };

    // === Support ===
    pub use crate::core::{I18n, MessageInterpolator, Pagination, QueryRequest, Secret};

    // === Config ===
    pub use crate::config::{Environment, WebConfig};

    // === Server ===
    pub use crate::server::logging::{CallLog, CallRecord};
    pub use crate::server::{CallId, WebServerBuilder};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use serde::{Deserialize, Serialize};

    // === Axum ===
    pub use axum::{
        Router,
        extract::{Path, State},
        http::StatusCode,
        routing::{delete, get, patch, post, put},
    };
}

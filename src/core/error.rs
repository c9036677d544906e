//! Typed errors and their HTTP envelopes
//!
//! Handlers return [`WebResult<T>`]; every [`WebError`] converts into a status
//! code plus a JSON envelope:
//!
//! | Variant | Status | Envelope |
//! |---|---|---|
//! | [`WebError::Validation`] | 422 | list of details, one per violation |
//! | [`WebError::BadRequest`] | 400 | list when details were given, single otherwise |
//! | [`WebError::Forbidden`] | 403 | single |
//! | [`WebError::NotFound`] | 404 | single |
//! | [`WebError::User`] | any | empty list |
//! | [`WebError::Server`] | 500 | single |
//! | [`WebError::Unclassified`] | 500 | single, raw message |
//!
//! # Example
//!
//! ```rust,ignore
//! use web_utils::prelude::*;
//!
//! async fn show(Path(id): Path<u32>) -> WebResult<Response<User>> {
//!     let user = users.get(id).ok_or_else(WebError::not_found)?;
//!     Ok(Response::ok(user))
//! }
//! ```

use crate::core::response::{ErrorDetail, ErrorResponse, Loggable, Response, json_response};
use crate::core::validation::{ConstraintError, ViolationSet};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced to API clients
#[derive(Debug, Error)]
pub enum WebError {
    /// One or more constraint violations
    #[error("{message}")]
    Validation {
        message: String,
        errors: Vec<ErrorDetail>,
    },

    /// Malformed or unparseable input
    #[error("{message}")]
    BadRequest {
        message: String,
        errors: Vec<ErrorDetail>,
    },

    #[error("{message}")]
    Forbidden { message: String },

    #[error("{message}")]
    NotFound { message: String },

    /// A user-facing error with an arbitrary status
    #[error("{message}")]
    User { status: StatusCode, message: String },

    /// Explicit internal failure
    #[error("{message}")]
    Server { message: String },

    /// Anything outside this taxonomy; the message reaches the client as-is
    #[error("{0}")]
    Unclassified(String),
}

impl WebError {
    /// `422` from a set of violations
    pub fn validation(violations: &ViolationSet) -> Self {
        WebError::Validation {
            message: "Validation Error".to_string(),
            errors: violations.to_error_details(),
        }
    }

    pub fn bad_request() -> Self {
        Self::bad_request_message("Bad Request")
    }

    pub fn bad_request_message(message: impl Into<String>) -> Self {
        WebError::BadRequest {
            message: message.into(),
            errors: Vec::new(),
        }
    }

    pub fn bad_request_with(errors: Vec<ErrorDetail>) -> Self {
        WebError::BadRequest {
            message: "Bad Request".to_string(),
            errors,
        }
    }

    /// `400` naming a required property absent from the input
    pub fn missing_property<S: AsRef<str>>(path: &[S]) -> Self {
        let path = path.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(".");
        let mut detail = ErrorDetail::new(format!("Property {path} is required"));
        detail.field = path.rsplit('.').next().map(str::to_string);
        Self::bad_request_with(vec![detail])
    }

    pub fn forbidden() -> Self {
        WebError::Forbidden {
            message: "Forbidden".to_string(),
        }
    }

    pub fn not_found() -> Self {
        WebError::NotFound {
            message: "Not Found".to_string(),
        }
    }

    pub fn user(status: StatusCode, message: impl Into<String>) -> Self {
        WebError::User {
            status,
            message: message.into(),
        }
    }

    pub fn server_error() -> Self {
        WebError::Server {
            message: "Internal Server Error".to_string(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            WebError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            WebError::Forbidden { .. } => StatusCode::FORBIDDEN,
            WebError::NotFound { .. } => StatusCode::NOT_FOUND,
            WebError::User { status, .. } => *status,
            WebError::Server { .. } | WebError::Unclassified(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            WebError::Validation { .. } => "VALIDATION_ERROR",
            WebError::BadRequest { .. } => "BAD_REQUEST",
            WebError::Forbidden { .. } => "FORBIDDEN",
            WebError::NotFound { .. } => "NOT_FOUND",
            WebError::User { .. } => "USER_ERROR",
            WebError::Server { .. } => "SERVER_ERROR",
            WebError::Unclassified(_) => "UNCLASSIFIED_ERROR",
        }
    }

    /// Build the envelope sent to the client
    pub fn to_response(&self) -> ErrorEnvelope {
        let status = self.status_code();
        let message = self.to_string();
        match self {
            WebError::Validation { errors, .. } => {
                ErrorEnvelope::List(ErrorResponse::new(status, message, errors.clone()))
            }
            WebError::BadRequest { errors, .. } if !errors.is_empty() => {
                ErrorEnvelope::List(ErrorResponse::new(status, message, errors.clone()))
            }
            WebError::User { .. } => {
                ErrorEnvelope::List(ErrorResponse::new(status, message, Vec::new()))
            }
            _ => ErrorEnvelope::Single(Response::new(status, message, None)),
        }
    }
}

/// Serialized form of a [`WebError`]
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ErrorEnvelope {
    Single(Response<()>),
    List(ErrorResponse),
}

impl ErrorEnvelope {
    pub fn status(&self) -> u16 {
        match self {
            ErrorEnvelope::Single(response) => response.status,
            ErrorEnvelope::List(response) => response.status,
        }
    }
}

impl Loggable for ErrorEnvelope {}

impl IntoResponse for WebError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        } else {
            tracing::debug!(code = self.error_code(), error = %self, "request rejected");
        }
        json_response(status, self.to_response())
    }
}

// =============================================================================
// Conversions from other errors
// =============================================================================

impl From<ConstraintError> for WebError {
    fn from(err: ConstraintError) -> Self {
        WebError::Server {
            message: err.to_string(),
        }
    }
}

/// Recovers a `WebError` carried through `anyhow`; anything else is unclassified
impl From<anyhow::Error> for WebError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<WebError>() {
            Ok(web_err) => web_err,
            Err(err) => WebError::Unclassified(err.to_string()),
        }
    }
}

/// A specialized Result type for handlers
pub type WebResult<T> = Result<T, WebError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::validation::Violation;
    use serde_json::Value;

    fn envelope_json(err: &WebError) -> Value {
        serde_json::to_value(err.to_response()).unwrap()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            WebError::validation(&ViolationSet::new()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(WebError::bad_request().status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(WebError::forbidden().status_code(), StatusCode::FORBIDDEN);
        assert_eq!(WebError::not_found().status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            WebError::server_error().status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            WebError::Unclassified("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_default_messages() {
        assert_eq!(WebError::bad_request().to_string(), "Bad Request");
        assert_eq!(WebError::forbidden().to_string(), "Forbidden");
        assert_eq!(WebError::not_found().to_string(), "Not Found");
        assert_eq!(WebError::server_error().to_string(), "Internal Server Error");
    }

    #[test]
    fn test_validation_envelope_lists_violations() {
        let violations: ViolationSet = vec![
            Violation::new(Some("name"), "Name is required"),
            Violation::new(Some("age"), "must be less than or equal to 14"),
        ]
        .into_iter()
        .collect();
        let json = envelope_json(&WebError::validation(&violations));

        assert_eq!(json["status"], 422);
        assert_eq!(json["message"], "Validation Error");
        assert_eq!(json["success"], false);
        assert_eq!(json["totalCount"], 2);
        assert_eq!(json["data"][0]["field"], "name");
        assert_eq!(json["data"][1]["message"], "must be less than or equal to 14");
    }

    #[test]
    fn test_forbidden_is_single_envelope() {
        let json = envelope_json(&WebError::forbidden());
        assert_eq!(json["status"], 403);
        assert_eq!(json["message"], "Forbidden");
        assert_eq!(json["data"], Value::Null);
        assert!(json.get("totalCount").is_none());
    }

    #[test]
    fn test_bad_request_shape_depends_on_constructor() {
        let single = envelope_json(&WebError::bad_request());
        assert!(single.get("totalCount").is_none());

        let list = envelope_json(&WebError::missing_property(&["nested", "macAddress"]));
        assert_eq!(list["totalCount"], 1);
        assert_eq!(list["data"][0]["message"], "Property nested.macAddress is required");
        assert_eq!(list["data"][0]["field"], "macAddress");
    }

    #[test]
    fn test_user_error_has_empty_list() {
        let err = WebError::user(StatusCode::FORBIDDEN, "UserException");
        let json = envelope_json(&err);
        assert_eq!(json["status"], 403);
        assert_eq!(json["success"], false);
        assert_eq!(json["data"].as_array().unwrap().len(), 0);
        assert_eq!(json["totalCount"], 0);
    }

    #[test]
    fn test_from_anyhow_recovers_web_error() {
        let err: WebError = anyhow::Error::new(WebError::not_found()).into();
        assert!(matches!(err, WebError::NotFound { .. }));
    }

    #[test]
    fn test_from_anyhow_unclassified_keeps_message() {
        let err: WebError = anyhow::anyhow!("connection reset").into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(envelope_json(&err)["message"], "connection reset");
    }

    #[test]
    fn test_from_constraint_error() {
        let err: WebError = ConstraintError::RuleWithoutField.into();
        assert_eq!(err.error_code(), "SERVER_ERROR");
    }
}

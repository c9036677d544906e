//! Core types: envelopes, errors, validation, redaction and small utilities

pub mod error;
pub mod field;
pub mod hash;
pub mod i18n;
pub mod query;
pub mod response;
pub mod secret;
pub mod validation;

pub use error::{ErrorEnvelope, WebError, WebResult};
pub use field::FieldValue;
pub use i18n::{I18n, MessageInterpolator, PassThrough};
pub use query::{Pagination, QueryRequest, parse_filters};
pub use response::{ErrorDetail, ErrorResponse, Loggable, LoggedBody, LoggedJson, Response, ResponseList};
pub use secret::{Secret, to_log_json};

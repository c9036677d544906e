//! Response envelopes
//!
//! Every JSON body produced by a service is wrapped in one of two envelopes:
//!
//! - [`Response<T>`]: a single payload under `data`
//! - [`ResponseList<T>`]: an array under `data` plus a sibling `totalCount`
//!
//! Both carry `status`, `message`, `timestamp` (epoch millis) and `success`.
//! [`ErrorResponse`] is the list envelope of [`ErrorDetail`]s used for validation
//! failures; its `totalCount` always equals the number of details.
//!
//! Envelopes implement [`Loggable`], so converting one into an HTTP response also
//! attaches a [`LoggedBody`] extension that the body logger renders through the
//! secret-aware mapper.

use crate::core::secret;
use crate::core::validation::ViolationSet;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::IntoResponse;
use serde::{Deserialize, Deserializer, Serialize};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// Header carrying the total number of items for list endpoints
pub const X_TOTAL_COUNT: &str = "x-total-count";

/// A single error entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub field: Option<String>,
}

impl ErrorDetail {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: 0,
            field: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_code(mut self, code: i32) -> Self {
        self.code = code;
        self
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn status_from_u16(status: u16) -> StatusCode {
    StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

// =============================================================================
// Single envelope
// =============================================================================

/// Envelope around a single payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response<T> {
    pub status: u16,
    pub message: String,
    pub timestamp: i64,
    pub success: bool,
    pub data: Option<T>,
}

impl<T> Response<T> {
    /// Create an envelope; `success` follows the status class
    pub fn new(status: StatusCode, message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            status: status.as_u16(),
            message: message.into(),
            timestamp: now_millis(),
            success: status.is_success(),
            data,
        }
    }

    /// `200 OK` envelope around `data`
    pub fn ok(data: T) -> Self {
        Self::new(StatusCode::OK, "OK", Some(data))
    }
}

impl<T> IntoResponse for Response<T>
where
    T: Serialize + Send + Sync + 'static,
{
    fn into_response(self) -> axum::response::Response {
        let status = status_from_u16(self.status);
        json_response(status, self)
    }
}

// =============================================================================
// List envelope
// =============================================================================

/// Envelope around a list payload
///
/// `totalCount` is derived from the list unless the envelope was built with
/// [`ResponseList::with_total`] for a paginated slice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseList<T> {
    pub status: u16,
    pub message: String,
    pub timestamp: i64,
    pub success: bool,
    data: Vec<T>,
    total_count: usize,
}

impl<T> ResponseList<T> {
    pub fn new(status: StatusCode, message: impl Into<String>, data: Vec<T>) -> Self {
        let total_count = data.len();
        Self {
            status: status.as_u16(),
            message: message.into(),
            timestamp: now_millis(),
            success: status.is_success(),
            data,
            total_count,
        }
    }

    pub fn ok(data: Vec<T>) -> Self {
        Self::new(StatusCode::OK, "OK", data)
    }

    /// `200 OK` page of a larger collection holding `total` items
    pub fn with_total(data: Vec<T>, total: usize) -> Self {
        let mut list = Self::ok(data);
        list.total_count = total;
        list
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Replace the payload; the total follows the new length
    pub fn set_data(&mut self, data: Vec<T>) {
        self.total_count = data.len();
        self.data = data;
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn into_data(self) -> Vec<T> {
        self.data
    }
}

impl<T> IntoResponse for ResponseList<T>
where
    T: Serialize + Send + Sync + 'static,
{
    fn into_response(self) -> axum::response::Response {
        let status = status_from_u16(self.status);
        let total = (self.success).then_some(self.total_count);
        let mut response = json_response(status, self);
        if let Some(total) = total {
            response
                .headers_mut()
                .insert(X_TOTAL_COUNT, HeaderValue::from(total));
        }
        response
    }
}

// =============================================================================
// Error envelope
// =============================================================================

/// List envelope of [`ErrorDetail`]s
///
/// Only constructible from details or violations, so `totalCount` always equals
/// the number of entries. Deserialization ignores an incoming `totalCount`.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct ErrorResponse(ResponseList<ErrorDetail>);

impl ErrorResponse {
    /// `422 Validation Error` envelope, one detail per violation
    pub fn from_violations(violations: &ViolationSet) -> Self {
        Self(ResponseList {
            success: false,
            ..ResponseList::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "Validation Error",
                violations.to_error_details(),
            )
        })
    }

    pub fn new(status: StatusCode, message: impl Into<String>, errors: Vec<ErrorDetail>) -> Self {
        Self(ResponseList {
            success: false,
            ..ResponseList::new(status, message, errors)
        })
    }

    pub fn into_inner(self) -> ResponseList<ErrorDetail> {
        self.0
    }
}

impl<'de> Deserialize<'de> for ErrorResponse {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Wire {
            status: u16,
            message: String,
            #[serde(default)]
            timestamp: i64,
            #[serde(default)]
            data: Vec<ErrorDetail>,
        }

        let wire = Wire::deserialize(deserializer)?;
        let mut response = Self::new(status_from_u16(wire.status), wire.message, wire.data);
        response.0.timestamp = wire.timestamp;
        Ok(response)
    }
}

impl Deref for ErrorResponse {
    type Target = ResponseList<ErrorDetail>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for ErrorResponse {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> axum::response::Response {
        let status = status_from_u16(self.0.status);
        json_response(status, self)
    }
}

// =============================================================================
// Loggable capability
// =============================================================================

/// Marker for response shapes whose bodies are captured by the body logger
///
/// Implemented by every envelope. Other types opt in with an empty impl and are
/// returned through [`LoggedJson`].
pub trait Loggable: Serialize + Send + Sync + 'static {}

impl<T: Serialize + Send + Sync + 'static> Loggable for Response<T> {}
impl<T: Serialize + Send + Sync + 'static> Loggable for ResponseList<T> {}
impl Loggable for ErrorResponse {}

trait RenderForLog: Send + Sync {
    fn render(&self) -> serde_json::Result<String>;
}

impl<T: Loggable> RenderForLog for T {
    fn render(&self) -> serde_json::Result<String> {
        secret::to_log_json(self)
    }
}

/// Response extension holding the object a response was serialized from
///
/// Rendering is deferred until a body logger asks for it, so responses outside a
/// logged scope never pay for the second serialization.
#[derive(Clone)]
pub struct LoggedBody(Arc<dyn RenderForLog>);

impl LoggedBody {
    pub fn new<T: Loggable>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Render through the secret-aware mapper
    pub fn render(&self) -> serde_json::Result<String> {
        self.0.render()
    }
}

impl std::fmt::Debug for LoggedBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("LoggedBody")
    }
}

/// `200 OK` JSON response for an arbitrary [`Loggable`] value
#[derive(Debug, Clone)]
pub struct LoggedJson<T>(pub T);

impl<T: Loggable> IntoResponse for LoggedJson<T> {
    fn into_response(self) -> axum::response::Response {
        json_response(StatusCode::OK, self.0)
    }
}

/// Serialize `value` as the body and attach it as a [`LoggedBody`]
pub(crate) fn json_response<T: Loggable>(status: StatusCode, value: T) -> axum::response::Response {
    match serde_json::to_vec(&value) {
        Ok(bytes) => {
            let mut response = (
                status,
                [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
                bytes,
            )
                .into_response();
            response.extensions_mut().insert(LoggedBody::new(value));
            response
        }
        Err(err) => {
            tracing::error!(error = %err, "failed to serialize response envelope");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::validation::Violation;
    use serde_json::json;

    #[test]
    fn test_response_ok_defaults() {
        let response = Response::ok(json!({"id": 1}));
        assert_eq!(response.status, 200);
        assert_eq!(response.message, "OK");
        assert!(response.success);
        assert!(response.timestamp > 0);
    }

    #[test]
    fn test_response_serialization_shape() {
        let mut response = Response::ok("hello");
        response.timestamp = 1_000;
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            json!({"status": 200, "message": "OK", "timestamp": 1000, "success": true, "data": "hello"})
        );
    }

    #[test]
    fn test_response_list_total_count_follows_data() {
        let mut list = ResponseList::ok(vec![1, 2, 3]);
        assert_eq!(list.total_count(), 3);

        list.set_data(vec![1]);
        assert_eq!(list.total_count(), 1);

        let value = serde_json::to_value(&list).unwrap();
        assert_eq!(value["totalCount"], 1);
        assert_eq!(value["data"], json!([1]));
    }

    #[test]
    fn test_response_list_with_total_for_pages() {
        let page = ResponseList::with_total(vec!["a", "b"], 40);
        assert_eq!(page.data().len(), 2);
        assert_eq!(page.total_count(), 40);
    }

    #[test]
    fn test_error_response_from_empty_violations() {
        let response = ErrorResponse::from_violations(&ViolationSet::new());
        assert_eq!(response.status, 422);
        assert_eq!(response.message, "Validation Error");
        assert!(!response.success);
        assert_eq!(response.total_count(), 0);
        assert!(response.data().is_empty());
    }

    #[test]
    fn test_error_response_total_count_matches_details() {
        let violations: ViolationSet = vec![
            Violation::new(Some("name"), "Name is required"),
            Violation::new(Some("age"), "must be less than or equal to 14"),
            Violation::new(None::<String>, "The password fields must match"),
        ]
        .into_iter()
        .collect();

        let response = ErrorResponse::from_violations(&violations);
        assert_eq!(response.total_count(), 3);
        assert_eq!(response.data().len(), 3);
        assert_eq!(response.data()[0].field.as_deref(), Some("name"));
        assert_eq!(response.data()[2].field, None);
    }

    #[test]
    fn test_error_response_deserialize_recounts_details() {
        let response: ErrorResponse = serde_json::from_value(json!({
            "status": 400,
            "message": "Bad Request",
            "timestamp": 1000,
            "success": true,
            "data": [{"message": "Property email is required", "field": "email"}],
            "totalCount": 5
        }))
        .unwrap();

        assert_eq!(response.total_count(), 1);
        assert_eq!(response.data().len(), 1);
        assert_eq!(response.data()[0].code, 0);
        assert_eq!(response.timestamp, 1000);
        assert!(!response.success);

        let empty: ErrorResponse = serde_json::from_value(json!({
            "status": 422,
            "message": "Validation Error",
            "data": [],
            "totalCount": 5
        }))
        .unwrap();
        assert_eq!(empty.total_count(), 0);
    }

    #[test]
    fn test_error_detail_defaults() {
        let detail: ErrorDetail = serde_json::from_str(r#"{"message":"boom"}"#).unwrap();
        assert_eq!(detail.code, 0);
        assert_eq!(detail.field, None);
    }

    #[test]
    fn test_into_response_attaches_logged_body() {
        let response = Response::ok(json!({"a": 1})).into_response();
        let logged = response.extensions().get::<LoggedBody>().unwrap();
        let rendered: serde_json::Value = serde_json::from_str(&logged.render().unwrap()).unwrap();
        assert_eq!(rendered["data"]["a"], 1);
    }

    #[test]
    fn test_list_response_sets_total_count_header() {
        let response = ResponseList::with_total(vec![1, 2], 12).into_response();
        assert_eq!(response.headers().get(X_TOTAL_COUNT).unwrap(), "12");
    }
}

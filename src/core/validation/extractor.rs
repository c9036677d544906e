//! Axum extractors for JSON request bodies
//!
//! - [`JsonBody<T>`] deserializes the body; failures become `400 Bad Request`
//! - [`ValidatedJson<T>`] also runs recursive validation; violations become `422`
//!
//! The [`Validator`] is taken from the request extensions when one was installed
//! (see `WebServerBuilder::with_validator`), otherwise a pass-through validator is used.

use super::engine::{Validatable, Validator};
use crate::core::error::WebError;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use regex::Regex;
use serde::de::DeserializeOwned;
use std::ops::Deref;
use std::sync::OnceLock;

/// Deserialized JSON body
///
/// # Usage
///
/// ```rust,ignore
/// pub async fn create(JsonBody(payload): JsonBody<NewUser>) -> WebResult<Response<User>> {
///     // payload parsed, not validated
/// }
/// ```
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<T> JsonBody<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for JsonBody<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = WebError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(map_rejection(&rejection)),
        }
    }
}

/// Deserialized and recursively validated JSON body
///
/// ```rust,ignore
/// pub async fn sign_up(ValidatedJson(payload): ValidatedJson<SignUp>) -> WebResult<Response<Id>> {
///     // payload passed every declared rule, nested values included
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T> ValidatedJson<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for ValidatedJson<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validatable,
{
    type Rejection = WebError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let validator = req
            .extensions()
            .get::<Validator>()
            .cloned()
            .unwrap_or_default();

        let JsonBody(payload) = JsonBody::<T>::from_request(req, state).await?;

        let violations = validator.validate_recursive(&payload)?;
        if violations.is_empty() {
            Ok(ValidatedJson(payload))
        } else {
            Err(WebError::validation(&violations))
        }
    }
}

fn map_rejection(rejection: &JsonRejection) -> WebError {
    let text = rejection.body_text();
    tracing::debug!(error = %text, "rejected request body");

    match rejection {
        JsonRejection::JsonDataError(_) => match missing_field_path(&text) {
            Some(path) => WebError::missing_property(&path),
            None => WebError::bad_request_message("Invalid request body"),
        },
        _ => WebError::bad_request_message("Invalid request body"),
    }
}

/// Extract `a.b.field` from a "missing field `field`" deserialization message
fn missing_field_path(text: &str) -> Option<Vec<String>> {
    static MISSING: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    let regex = MISSING
        .get_or_init(|| {
            Regex::new(r"(?:target type: (?P<path>[^\s:]+): )?missing field `(?P<field>[^`]+)`")
        })
        .as_ref()
        .ok()?;

    let captures = regex.captures(text)?;
    let mut path: Vec<String> = captures
        .name("path")
        .map(|p| {
            p.as_str()
                .split('.')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    path.push(captures["field"].to_string());
    Some(path)
}

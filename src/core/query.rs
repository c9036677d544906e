//! Query string helpers: pagination, filters and typed query extraction

use crate::core::error::WebError;
use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::Deref;

/// Pagination parameters for list endpoints
///
/// All parameters are optional in the query string and fall back to defaults.
///
/// # Example
/// ```rust,ignore
/// pub async fn list_items(pagination: Pagination) -> ResponseList<Item> {
///     // pagination.limit defaults to 10, pagination.sort_by to "id"
/// }
///
/// // Usage:
/// GET /items?limit=20&offset=40
/// GET /items?sortBy=createdAt&orderBy=ASC
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub limit: u32,
    pub offset: u32,
    pub sort_by: String,
    pub order_by: String,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: 10,
            offset: 0,
            sort_by: "id".to_string(),
            order_by: "DESC".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPagination {
    limit: Option<u32>,
    offset: Option<u32>,
    sort_by: Option<String>,
    order_by: Option<String>,
}

impl Pagination {
    /// Overlay the parameters present in the query on `defaults`
    fn from_raw(raw: RawPagination, defaults: Pagination) -> Self {
        Self {
            limit: raw.limit.unwrap_or(defaults.limit),
            offset: raw.offset.unwrap_or(defaults.offset),
            sort_by: raw.sort_by.unwrap_or(defaults.sort_by),
            order_by: raw.order_by.unwrap_or(defaults.order_by),
        }
    }

    /// Parse a raw query string, using `defaults` for absent parameters
    pub fn from_query(query: &str, defaults: Pagination) -> Result<Self, WebError> {
        let Query(raw) = Query::<RawPagination>::try_from_uri(
            &format!("/?{query}")
                .parse::<axum::http::Uri>()
                .map_err(|_| WebError::bad_request_message("Invalid query string"))?,
        )
        .map_err(|rejection| {
            tracing::debug!(error = %rejection.body_text(), "rejected pagination");
            WebError::bad_request_message("Invalid pagination parameters")
        })?;
        Ok(Self::from_raw(raw, defaults))
    }

    /// Whether results are sorted in descending order
    pub fn is_descending(&self) -> bool {
        self.order_by.eq_ignore_ascii_case("desc")
    }
}

impl<S> FromRequestParts<S> for Pagination
where
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_query(parts.uri.query().unwrap_or_default(), Pagination::default())
    }
}

/// Collect `filters.<name>=value` query parameters as `NAME -> value`
///
/// A repeated filter keeps its first value.
///
/// ```rust,ignore
/// // ?filters.status=active&filters.city=Paris&limit=5
/// // => {"STATUS": "active", "CITY": "Paris"}
/// ```
pub fn parse_filters<'a, I>(params: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut filters = HashMap::new();
    for (key, value) in params {
        if !key.contains("filters.") {
            continue;
        }
        if let Some((_, name)) = key.split_once('.') {
            filters
                .entry(name.to_uppercase())
                .or_insert_with(|| value.to_string());
        }
    }
    filters
}

/// Typed query string; deserialization failures become `400 Bad Request`
#[derive(Debug, Clone)]
pub struct QueryRequest<T>(pub T);

impl<T> Deref for QueryRequest<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<S, T> FromRequestParts<S> for QueryRequest<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::try_from_uri(&parts.uri) {
            Ok(Query(value)) => Ok(QueryRequest(value)),
            Err(rejection) => {
                tracing::debug!(error = %rejection.body_text(), "rejected query string");
                Err(WebError::bad_request())
            }
        }
    }
}

//! Default CORS policy

use crate::config::CorsConfig;
use crate::core::response::X_TOTAL_COUNT;
use crate::server::call_id::X_REQUEST_ID;
use axum::http::{HeaderName, HeaderValue, Method, header};
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Build the CORS layer for `config`
///
/// Simple methods plus OPTIONS, PUT, DELETE and PATCH are allowed, JSON and other
/// non-simple content types may be sent, and `X-Total-Count` is readable by
/// browser clients. With no configured origins the request origin is mirrored.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origin = if config.allowed_origins.is_empty() {
        AllowOrigin::mirror_request()
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    let layer = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::HEAD,
            Method::OPTIONS,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(X_TOTAL_COUNT),
            X_REQUEST_ID,
        ])
        .expose_headers([HeaderName::from_static(X_TOTAL_COUNT), X_REQUEST_ID])
        .allow_credentials(config.allow_credentials);

    match config.max_age_secs {
        Some(secs) => layer.max_age(Duration::from_secs(secs)),
        None => layer,
    }
}

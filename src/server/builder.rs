//! WebServerBuilder for fluent API to build HTTP servers

use super::call_id::call_id;
use super::cors::cors_layer;
use super::logging::{BodyLogger, CallLogging, CallRecord, body_logger, call_logging};
use super::status::{handle_panic, status_pages};
use crate::config::WebConfig;
use crate::core::validation::{ConstraintError, Validatable, Validator};
use anyhow::Result;
use axum::extract::Request;
use axum::{Extension, Router, middleware};
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;

type Preflight = fn() -> Result<(), ConstraintError>;

/// Builder wrapping application routes with the standard layers
///
/// From the outside in: CORS, call id, call logging, status pages, panic
/// recovery, then the application routes. Routes added with
/// [`with_logged_routes`](Self::with_logged_routes) also get the body logger.
///
/// # Example
///
/// ```ignore
/// let app = WebServerBuilder::new(WebConfig::from_yaml_file("web.yaml")?)
///     .with_routes(Router::new().route("/health", get(health)))
///     .with_logged_routes(Router::new().route("/users", post(create_user)))
///     .with_validator(Validator::with_interpolator(i18n))
///     .build();
/// ```
pub struct WebServerBuilder {
    config: WebConfig,
    routes: Vec<Router>,
    logged_routes: Vec<Router>,
    validator: Option<Validator>,
    call_logging: CallLogging,
    preflights: Vec<Preflight>,
}

impl WebServerBuilder {
    pub fn new(config: WebConfig) -> Self {
        let call_logging = CallLogging::new(&config.logging, config.environment());
        Self {
            config,
            routes: Vec::new(),
            logged_routes: Vec::new(),
            validator: None,
            call_logging,
            preflights: Vec::new(),
        }
    }

    /// Add routes whose bodies are not captured
    pub fn with_routes(mut self, routes: Router) -> Self {
        self.routes.push(routes);
        self
    }

    /// Add routes whose request and response bodies appear in the call line
    pub fn with_logged_routes(mut self, routes: Router) -> Self {
        self.logged_routes.push(routes);
        self
    }

    /// Validator used by `ValidatedJson`, e.g. one translating messages
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Check the constraint declaration of `T` before serving
    pub fn with_request_type<T: Validatable>(mut self) -> Self {
        self.preflights.push(Validator::preflight::<T>);
        self
    }

    /// Build the constraints of every registered request type
    pub fn preflight(&self) -> Result<(), ConstraintError> {
        self.preflights.iter().try_for_each(|check| check())
    }

    /// Receive every call record, e.g. to ship it to an audit store
    pub fn with_call_record_hook(
        mut self,
        hook: impl Fn(&CallRecord) + Send + Sync + 'static,
    ) -> Self {
        self.call_logging = self.call_logging.with_hook(hook);
        self
    }

    /// Resolve the `userId` of the call line from the request
    pub fn with_user_id(
        mut self,
        resolve: impl Fn(&Request) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.call_logging = self.call_logging.with_user_id(resolve);
        self
    }

    /// Build the final router
    pub fn build(self) -> Router {
        let body_logging = BodyLogger::new(&self.config.logging);

        let mut app = Router::new();
        for routes in self.routes {
            app = app.merge(routes);
        }
        for routes in self.logged_routes {
            app = app.merge(routes.layer(middleware::from_fn_with_state(
                body_logging.clone(),
                body_logger,
            )));
        }

        if let Some(validator) = self.validator {
            app = app.layer(Extension(validator));
        }

        app.layer(CatchPanicLayer::custom(handle_panic))
            .layer(middleware::from_fn(status_pages))
            .layer(middleware::from_fn_with_state(
                self.call_logging,
                call_logging,
            ))
            .layer(middleware::from_fn(call_id))
            .layer(cors_layer(&self.config.cors))
    }

    /// Serve the application with graceful shutdown
    ///
    /// This will:
    /// - Check the constraints of every registered request type
    /// - Bind to the provided address
    /// - Start serving requests
    /// - Handle SIGTERM and SIGINT (Ctrl+C) for graceful shutdown
    pub async fn serve(self, addr: &str) -> Result<()> {
        self.preflight()?;
        let app = self.build();
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for WebServerBuilder {
    fn default() -> Self {
        Self::new(WebConfig::default())
    }
}

/// Wait for Ctrl+C or SIGTERM
///
/// A handler that cannot be installed is logged and that signal is never awaited.
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::field::FieldValue;
    use crate::core::validation::{Constraints, NotNull, Pattern};
    use crate::server::call_id::X_REQUEST_ID;
    use axum::body::Body;
    use axum::http::StatusCode;
    use axum::routing::get;
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;

    fn get_request(uri: &str) -> axum::http::Request<Body> {
        axum::http::Request::builder()
            .uri(uri)
            .header("x-request-id", "trace-1")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_default_builder_serves_routes() {
        let app = WebServerBuilder::default()
            .with_routes(Router::new().route("/health", get(|| async { "up" })))
            .build();

        let response = app.oneshot(get_request("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(&X_REQUEST_ID).unwrap(), "trace-1");
    }

    #[tokio::test]
    async fn test_call_id_reaches_call_record() {
        let records = Arc::new(Mutex::new(Vec::new()));
        let sink = records.clone();

        let app = WebServerBuilder::default()
            .with_routes(Router::new().route("/health", get(|| async { "up" })))
            .with_call_record_hook(move |record| sink.lock().unwrap().push(record.clone()))
            .build();

        app.oneshot(get_request("/health")).await.unwrap();

        let records = records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].trace_uuid.as_deref(), Some("trace-1"));
    }

    struct BadPattern;

    impl Validatable for BadPattern {
        fn constraints() -> std::result::Result<Constraints<Self>, ConstraintError> {
            Constraints::builder()
                .field("code", |_: &Self| FieldValue::Null)
                .rule(Pattern::new("(unclosed")?)
                .build()
        }
    }

    struct GoodRequest;

    impl Validatable for GoodRequest {
        fn constraints() -> std::result::Result<Constraints<Self>, ConstraintError> {
            Constraints::builder()
                .field("code", |_: &Self| FieldValue::Null)
                .rule(NotNull::new())
                .build()
        }
    }

    #[test]
    fn test_preflight_checks_registered_types() {
        let builder = WebServerBuilder::default().with_request_type::<GoodRequest>();
        assert!(builder.preflight().is_ok());

        let builder = builder.with_request_type::<BadPattern>();
        assert!(matches!(
            builder.preflight(),
            Err(ConstraintError::InvalidPattern { .. })
        ));
    }

    #[tokio::test]
    async fn test_serve_refuses_bad_declarations() {
        let err = WebServerBuilder::default()
            .with_request_type::<BadPattern>()
            .serve("127.0.0.1:0")
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<ConstraintError>().is_some());
    }

    #[tokio::test]
    async fn test_validator_is_installed_as_extension() {
        let app = WebServerBuilder::default()
            .with_routes(Router::new().route(
                "/check",
                get(|validator: Option<Extension<Validator>>| async move {
                    if validator.is_some() { "installed" } else { "missing" }
                }),
            ))
            .with_validator(Validator::new())
            .build();

        let response = app.oneshot(get_request("/check")).await.unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body, "installed".as_bytes());
    }
}

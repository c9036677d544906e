//! One structured log line per HTTP call
//!
//! [`call_logging`] opens a [`CallLog`] for the request, lets the inner layers fill
//! it, then assembles a [`CallRecord`] and emits it as a single `tracing` event:
//!
//! ```text
//! INFO 200: POST - /users headers="{\n\"authorization\":\"*****\"\n}" httpMethod="POST" ...
//! ```

use super::call_log::CallLog;
use super::redact::{Redactor, entries_to_json_string};
use crate::config::{Environment, LogLevel, LoggingConfig};
use crate::server::call_id::CallId;
use axum::extract::{Query, Request, State};
use axum::http::{HeaderMap, Uri};
use axum::middleware::Next;
use axum::response::Response;
use serde::Serialize;
use std::sync::Arc;

/// Names of the correlation fields carried by every call line
pub mod fields {
    pub const HEADERS: &str = "headers";
    pub const QUERY_PARAMETERS: &str = "queryParameters";
    pub const HTTP_METHOD: &str = "httpMethod";
    pub const REQUEST_PATH: &str = "requestPath";
    pub const REQUEST_BODY: &str = "requestBody";
    pub const RESPONSE_BODY: &str = "responseBody";
    pub const TRACE_UUID: &str = "traceUUID";
    pub const STATUS_CODE: &str = "statusCode";
    pub const ENV: &str = "env";
    pub const USER_ID: &str = "userId";
}

/// Everything known about a finished call
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRecord {
    pub message: String,
    pub headers: Option<String>,
    pub query_parameters: Option<String>,
    pub http_method: String,
    pub request_path: String,
    pub request_body: Option<String>,
    pub response_body: Option<String>,
    #[serde(rename = "traceUUID")]
    pub trace_uuid: Option<String>,
    pub status_code: u16,
    pub env: Environment,
    pub user_id: Option<String>,
}

impl CallRecord {
    /// Present correlation fields as `(name, value)` pairs
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let optional = [
            (fields::HEADERS, &self.headers),
            (fields::QUERY_PARAMETERS, &self.query_parameters),
            (fields::REQUEST_BODY, &self.request_body),
            (fields::RESPONSE_BODY, &self.response_body),
            (fields::TRACE_UUID, &self.trace_uuid),
            (fields::USER_ID, &self.user_id),
        ];

        let mut pairs = vec![
            (fields::HTTP_METHOD, self.http_method.clone()),
            (fields::REQUEST_PATH, self.request_path.clone()),
            (fields::STATUS_CODE, self.status_code.to_string()),
            (fields::ENV, self.env.as_str().to_string()),
        ];
        pairs.extend(
            optional
                .into_iter()
                .filter_map(|(name, value)| value.clone().map(|value| (name, value))),
        );
        pairs
    }
}

pub type CallRecordHook = Arc<dyn Fn(&CallRecord) + Send + Sync>;
pub type UserIdResolver = Arc<dyn Fn(&Request) -> Option<String> + Send + Sync>;
pub type MessageFormat = Arc<dyn Fn(&CallRecord) -> String + Send + Sync>;

/// Settings and hooks for [`call_logging`]
#[derive(Clone)]
pub struct CallLogging {
    level: LogLevel,
    redactor: Arc<Redactor>,
    path_filters: Arc<Vec<String>>,
    env: Environment,
    hook: Option<CallRecordHook>,
    user_id: Option<UserIdResolver>,
    format: Option<MessageFormat>,
}

impl CallLogging {
    pub fn new(config: &LoggingConfig, env: Environment) -> Self {
        Self {
            level: config.level,
            redactor: Arc::new(Redactor::new(&config.secret_fields)),
            path_filters: Arc::new(config.path_filters.clone()),
            env,
            hook: None,
            user_id: None,
            format: None,
        }
    }

    /// Receive every assembled record after it is logged
    pub fn with_hook(mut self, hook: impl Fn(&CallRecord) + Send + Sync + 'static) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Resolve the caller's id from the request before it is handled
    pub fn with_user_id(
        mut self,
        resolve: impl Fn(&Request) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.user_id = Some(Arc::new(resolve));
        self
    }

    /// Replace the `"<status>: <METHOD> - <path>"` message
    pub fn with_message_format(
        mut self,
        format: impl Fn(&CallRecord) -> String + Send + Sync + 'static,
    ) -> Self {
        self.format = Some(Arc::new(format));
        self
    }

    fn is_logged(&self, path: &str) -> bool {
        self.path_filters.is_empty()
            || self
                .path_filters
                .iter()
                .any(|prefix| path.starts_with(prefix.as_str()))
    }

    fn render_headers(&self, headers: &HeaderMap) -> Option<String> {
        let entries = headers
            .iter()
            .map(|(name, value)| (name.as_str(), String::from_utf8_lossy(value.as_bytes())));
        entries_to_json_string(entries).map(|text| self.redactor.redact(&text))
    }

    fn render_query(&self, uri: &Uri) -> Option<String> {
        let pairs = match Query::<Vec<(String, String)>>::try_from_uri(uri) {
            Ok(Query(pairs)) => pairs,
            Err(rejection) => {
                tracing::debug!(error = %rejection.body_text(), "unparseable query string");
                Vec::new()
            }
        };
        entries_to_json_string(pairs).map(|text| self.redactor.redact(&text))
    }

    fn message(&self, record: &CallRecord) -> String {
        match &self.format {
            Some(format) => format(record),
            None => format!(
                "{}: {} - {}",
                record.status_code, record.http_method, record.request_path
            ),
        }
    }

    fn emit(&self, record: &CallRecord) {
        macro_rules! call_event {
            ($level:expr) => {
                tracing::event!(
                    $level,
                    headers = record.headers.as_deref(),
                    queryParameters = record.query_parameters.as_deref(),
                    httpMethod = record.http_method.as_str(),
                    requestPath = record.request_path.as_str(),
                    requestBody = record.request_body.as_deref(),
                    responseBody = record.response_body.as_deref(),
                    traceUUID = record.trace_uuid.as_deref(),
                    statusCode = record.status_code,
                    env = record.env.as_str(),
                    userId = record.user_id.as_deref(),
                    "{}",
                    record.message
                )
            };
        }

        match self.level {
            LogLevel::Trace => call_event!(tracing::Level::TRACE),
            LogLevel::Debug => call_event!(tracing::Level::DEBUG),
            LogLevel::Info => call_event!(tracing::Level::INFO),
            LogLevel::Warn => call_event!(tracing::Level::WARN),
            LogLevel::Error => call_event!(tracing::Level::ERROR),
        }
    }
}

impl Default for CallLogging {
    fn default() -> Self {
        Self::new(&LoggingConfig::default(), Environment::from_env())
    }
}

impl std::fmt::Debug for CallLogging {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallLogging")
            .field("level", &self.level)
            .field("path_filters", &self.path_filters)
            .field("env", &self.env)
            .field("hook", &self.hook.is_some())
            .field("user_id", &self.user_id.is_some())
            .finish()
    }
}

/// Call-logging middleware, installed with `middleware::from_fn_with_state`
pub async fn call_logging(
    State(logging): State<CallLogging>,
    mut req: Request,
    next: Next,
) -> Response {
    let request_path = req.uri().path().to_string();
    if !logging.is_logged(&request_path) {
        return next.run(req).await;
    }

    let call_log = CallLog::new();
    req.extensions_mut().insert(call_log.clone());

    let http_method = req.method().to_string();
    let headers = logging.render_headers(req.headers());
    let query_parameters = logging.render_query(req.uri());
    let trace_uuid = req.extensions().get::<CallId>().map(|id| id.to_string());
    let user_id = logging.user_id.as_ref().and_then(|resolve| resolve(&req));

    let response = next.run(req).await;

    let captured = call_log.take();
    let mut record = CallRecord {
        message: String::new(),
        headers,
        query_parameters,
        http_method,
        request_path,
        request_body: captured.request_body,
        response_body: captured.response_body,
        trace_uuid,
        status_code: response.status().as_u16(),
        env: logging.env,
        user_id,
    };
    record.message = logging.message(&record);

    logging.emit(&record);
    if let Some(hook) = &logging.hook {
        hook(&record);
    }

    response
}

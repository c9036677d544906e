//! Configuration loading and management
//!
//! ```yaml
//! environment: prod
//! logging:
//!   level: info
//!   secret_fields: [password, token, authorization, pin]
//!   body_limit: 65536
//!   path_filters: ["/api"]
//! cors:
//!   allowed_origins: ["https://app.example.com"]
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Process variable holding the deployment environment label
pub const ENV_VARIABLE: &str = "env";

/// Deployment environment, surfaced in log lines only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
    #[default]
    Local,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Prod => "prod",
            Environment::Local => "local",
        }
    }

    /// Read the label from the `env` variable; unknown or absent means `local`
    pub fn from_env() -> Self {
        match std::env::var(ENV_VARIABLE) {
            Ok(value) => value.parse().unwrap_or_else(|_| {
                tracing::warn!(value = %value, "unknown environment label, using local");
                Environment::Local
            }),
            Err(_) => Environment::Local,
        }
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            "local" => Ok(Environment::Local),
            other => Err(format!("unknown environment '{other}'")),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Level of the per-call log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Call and body logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level of the per-call log line
    pub level: LogLevel,

    /// Keys whose values are masked in header, query and body dumps (case-insensitive)
    pub secret_fields: Vec<String>,

    /// Largest request body captured for logging, in bytes
    pub body_limit: usize,

    /// Content-type prefixes whose bodies are never captured
    pub skip_content_types: Vec<String>,

    /// Pretty-print captured response bodies
    pub pretty_json: bool,

    /// Only log calls whose path starts with one of these; empty logs everything
    pub path_filters: Vec<String>,

    /// Emit JSON lines instead of the human-readable format
    pub json_output: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            secret_fields: vec![
                "password".to_string(),
                "token".to_string(),
                "authorization".to_string(),
            ],
            body_limit: 1024 * 1024,
            skip_content_types: vec![
                "multipart/".to_string(),
                "application/octet-stream".to_string(),
            ],
            pretty_json: false,
            path_filters: Vec::new(),
            json_output: false,
        }
    }
}

/// CORS settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins; empty mirrors the request origin (any host)
    pub allowed_origins: Vec<String>,

    pub allow_credentials: bool,

    /// Preflight cache duration in seconds
    pub max_age_secs: Option<u64>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            allow_credentials: true,
            max_age_secs: None,
        }
    }
}

/// Complete configuration for the web utilities
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Environment label; read from the `env` variable when absent
    pub environment: Option<Environment>,

    pub logging: LoggingConfig,

    pub cors: CorsConfig,
}

impl WebConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Configured environment, falling back to the process variable
    pub fn environment(&self) -> Environment {
        self.environment.unwrap_or_else(Environment::from_env)
    }
}

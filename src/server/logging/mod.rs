//! Structured call logging with secret redaction
//!
//! Two middlewares cooperate through a per-request [`CallLog`]:
//!
//! - [`call_logging`] wraps the whole application, opens the [`CallLog`] and emits
//!   one event per call with the correlation fields named in [`fields`]
//! - [`body_logger`] wraps selected routes and captures the request body and the
//!   rendered response envelope into that log
//!
//! Header and query dumps go through the string-level [`Redactor`]; response
//! envelopes are rendered with [`crate::core::secret`] masking applied.

pub mod body;
pub mod call;
pub mod call_log;
pub mod redact;

pub use crate::config::Environment;
pub use body::{BodyLogger, body_logger};
pub use call::{CallLogging, CallRecord, CallRecordHook, UserIdResolver, call_logging, fields};
pub use call_log::{CallLog, CallLogState};
pub use redact::{REDACTED, Redactor, entries_to_json_string};

use crate::config::LoggingConfig;
use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global `tracing` subscriber writing to stdout
///
/// Filtering follows `RUST_LOG` and defaults to `info`. With `json_output` set every
/// event, call lines included, is written as one JSON object per line.
pub fn init_tracing(config: &LoggingConfig) -> anyhow::Result<()> {
    subscriber(config, std::io::stdout).try_init()?;
    Ok(())
}

/// Subscriber described by `config`, writing through `writer`
pub fn subscriber<W>(config: &LoggingConfig, writer: W) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let output: Box<dyn Layer<Registry> + Send + Sync> = if config.json_output {
        tracing_subscriber::fmt::layer().json().with_writer(writer).boxed()
    } else {
        tracing_subscriber::fmt::layer().with_writer(writer).boxed()
    };

    tracing_subscriber::registry().with(output).with(filter)
}

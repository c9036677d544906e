//! TCP reachability helpers for startup ordering and tests

use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};

/// Whether something accepts TCP connections on `host:port` within `wait`
pub async fn is_tcp_port_available(host: &str, port: u16, wait: Duration) -> bool {
    matches!(
        timeout(wait, TcpStream::connect((host, port))).await,
        Ok(Ok(_))
    )
}

/// Poll `host:port` every `interval` until it accepts connections
///
/// Returns `true` as soon as a connection succeeds, `false` after `attempts` failures.
pub async fn await_service(host: &str, port: u16, interval: Duration, attempts: u32) -> bool {
    for attempt in 1..=attempts {
        if is_tcp_port_available(host, port, interval).await {
            tracing::debug!(host, port, attempt, "service is up");
            return true;
        }
        tracing::debug!(host, port, attempt, attempts, "service not up yet");
        if attempt < attempts {
            sleep(interval).await;
        }
    }
    tracing::warn!(host, port, attempts, "service did not come up");
    false
}

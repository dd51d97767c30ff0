//! TCP readiness probe
//!
//! The desktop shell treats "the port accepts a connection" as the only
//! readiness signal. This module performs that check.

use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout as with_deadline, Instant};

/// Default delay between connection attempts
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Default overall bound on the wait
pub const STARTUP_TIMEOUT: Duration = Duration::from_millis(15_000);

#[derive(Debug, Error)]
pub enum ReadinessError {
    /// Nothing accepted a connection before the deadline
    #[error("{addr} not ready after {waited:?}")]
    TimedOut { addr: String, waited: Duration },
}

/// Polls `host:port` until a TCP connection succeeds or `timeout` elapses
///
/// Returns how long the wait took.
pub async fn wait_for_port(
    host: &str,
    port: u16,
    timeout: Duration,
    interval: Duration,
) -> Result<Duration, ReadinessError> {
    let addr = format!("{}:{}", host, port);
    let start = Instant::now();

    loop {
        let remaining = timeout.saturating_sub(start.elapsed());
        match with_deadline(remaining, TcpStream::connect(&addr)).await {
            Ok(Ok(_)) => return Ok(start.elapsed()),
            Ok(Err(err)) => {
                tracing::debug!(%addr, error = %err, "port not ready yet");
            }
            Err(_) => {
                tracing::debug!(%addr, "connect attempt hit the deadline");
            }
        }

        if start.elapsed() >= timeout {
            return Err(ReadinessError::TimedOut {
                addr,
                waited: start.elapsed(),
            });
        }
        sleep(interval).await;
    }
}

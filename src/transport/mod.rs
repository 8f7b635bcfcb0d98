use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Connection to {target} failed: {source}")]
    Connect {
        target: String,
        source: std::io::Error,
    },
    #[error("Write to {target} failed: {source}")]
    Write {
        target: String,
        source: std::io::Error,
    },
    #[error("{operation} to {target} timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        target: String,
        timeout: Duration,
    },
}

/// Deliver one encoded batch over a single TCP connection.
///
/// One run equals one connection equals one payload: connect, write the
/// whole frame, flush, shut down. No retry, no reconnect.
pub async fn send(host: &str, port: u16, payload: &[u8]) -> Result<(), TransportError> {
    let target = format!("{host}:{port}");

    let mut stream = timeout(CONNECT_TIMEOUT, TcpStream::connect((host, port)))
        .await
        .map_err(|_| TransportError::Timeout {
            operation: "connect",
            target: target.clone(),
            timeout: CONNECT_TIMEOUT,
        })?
        .map_err(|source| TransportError::Connect {
            target: target.clone(),
            source,
        })?;

    let write = async {
        stream.write_all(payload).await?;
        stream.flush().await?;
        stream.shutdown().await
    };

    timeout(WRITE_TIMEOUT, write)
        .await
        .map_err(|_| TransportError::Timeout {
            operation: "write",
            target: target.clone(),
            timeout: WRITE_TIMEOUT,
        })?
        .map_err(|source| TransportError::Write { target, source })?;

    debug!(bytes = payload.len(), "payload delivered");
    Ok(())
}

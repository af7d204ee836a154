//! TCP transport to the HORIZONS telnet port.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use horizons_client::transport::TcpTransport;
//!
//! let stream = TcpTransport::connect("horizons.jpl.nasa.gov", 6775, Duration::from_secs(10)).await?;
//! println!("connected to {}", stream.addr());
//! ```

use std::fmt;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

use crate::error::{HorizonsError, Result, StepContext};

/// Lifecycle of one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Resolving and connecting.
    Connecting,
    /// Connected, no text received yet (only negotiation so far).
    Negotiating,
    /// Text is flowing.
    Open,
    /// Local side is shutting down.
    Closing,
    /// Closed cleanly by either side.
    Closed,
    /// Aborted after an error.
    Failed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connecting => "connecting",
            Self::Negotiating => "negotiating",
            Self::Open => "open",
            Self::Closing => "closing",
            Self::Closed => "closed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Connected TCP stream.
#[derive(Debug)]
pub struct TcpTransport {
    stream: TcpStream,
    addr: String,
}

impl TcpTransport {
    /// Connect to `host:port`, giving up after `timeout`.
    ///
    /// # Errors
    ///
    /// - [`HorizonsError::Connect`] if resolution or the connect fails
    /// - [`HorizonsError::Timeout`] if no connection is made in time
    pub async fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self> {
        let addr = format!("{}:{}", host, port);
        tracing::debug!("Connection {} ({})", ConnectionState::Connecting, addr);

        let stream = match tokio::time::timeout(timeout, TcpStream::connect(addr.as_str())).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => {
                tracing::warn!("Failed to connect to {}: {}", addr, source);
                return Err(HorizonsError::Connect { addr, source });
            }
            Err(_) => {
                tracing::warn!("Timed out connecting to {}", addr);
                return Err(HorizonsError::Timeout {
                    step: StepContext::connect(&addr),
                    timeout,
                });
            }
        };

        // Prompts are small; don't let Nagle hold our answers back.
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!("Failed to set TCP_NODELAY: {}", e);
        }

        tracing::debug!("Connected to {}", addr);
        Ok(Self { stream, addr })
    }

    /// `host:port` this transport was connected to.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Get a reference to the underlying stream.
    pub fn inner(&self) -> &TcpStream {
        &self.stream
    }

    /// Unwrap the underlying stream.
    pub fn into_inner(self) -> TcpStream {
        self.stream
    }
}

impl AsyncRead for TcpTransport {
    fn poll_read(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
        buf: &mut tokio::io::ReadBuf<'_>,
    ) -> std::task::Poll<std::io::Result<()>> {
        std::pin::Pin::new(&mut self.stream).poll_read(cx, buf)
    }
}

impl AsyncWrite for TcpTransport {
    fn poll_write(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
        buf: &[u8],
    ) -> std::task::Poll<std::io::Result<usize>> {
        std::pin::Pin::new(&mut self.stream).poll_write(cx, buf)
    }

    fn poll_flush(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<std::io::Result<()>> {
        std::pin::Pin::new(&mut self.stream).poll_flush(cx)
    }

    fn poll_shutdown(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<std::io::Result<()>> {
        std::pin::Pin::new(&mut self.stream).poll_shutdown(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_connect_and_exchange() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket.write_all(b"Horizons> ").await.unwrap();
            let mut buf = [0u8; 4];
            socket.read_exact(&mut buf).await.unwrap();
            buf
        });

        let mut transport = TcpTransport::connect("127.0.0.1", port, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(transport.addr(), format!("127.0.0.1:{}", port));

        let mut buf = [0u8; 10];
        transport.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"Horizons> ");

        transport.write_all(b"399\n").await.unwrap();
        assert_eq!(&server.await.unwrap(), b"399\n");
    }

    #[tokio::test]
    async fn test_connection_refused_is_connect_error() {
        // Bind then drop to get a port nobody listens on.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };

        let err = TcpTransport::connect("127.0.0.1", port, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, HorizonsError::Connect { .. }), "got {:?}", err);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(ConnectionState::Negotiating.to_string(), "negotiating");
        assert_eq!(ConnectionState::Failed.to_string(), "failed");
    }
}

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::net::TcpStream;
use tracing::debug;

use crate::error::{Result, TransportError};
use crate::traits::Connector;

/// Host used when none is configured.
pub const DEFAULT_HOST: &str = "localhost";

/// Well-known server port.
pub const DEFAULT_PORT: u16 = 6600;

/// Connects over TCP.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    host: String,
    port: u16,
    connect_timeout: Option<Duration>,
}

impl TcpConnector {
    /// Create a connector for `host:port`.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            connect_timeout: None,
        }
    }

    /// Bound each connect attempt.
    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        "tcp"
    }

    async fn open(&self) -> Result<TcpStream> {
        if self.host.is_empty() {
            return Err(TransportError::InvalidAddress("empty host".to_string()));
        }

        let addr = self.to_string();
        let attempt = TcpStream::connect((self.host.as_str(), self.port));
        let stream = match self.connect_timeout {
            Some(timeout) => tokio::time::timeout(timeout, attempt)
                .await
                .map_err(|_| TransportError::ConnectTimeout {
                    addr: addr.clone(),
                    timeout,
                })?,
            None => attempt.await,
        }
        .map_err(|source| TransportError::Connect {
            addr: addr.clone(),
            source,
        })?;

        // Commands are single short lines.
        stream.set_nodelay(true)?;
        debug!(%addr, "connected over tcp");
        Ok(stream)
    }
}

impl Default for TcpConnector {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

impl fmt::Display for TcpConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Bare IPv6 literals need brackets to stay parseable.
        if self.host.contains(':') && !self.host.starts_with('[') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl Connector for TcpConnector {
    type Stream = TcpStream;

    fn connect(&self) -> impl Future<Output = Result<Self::Stream>> + Send {
        self.open()
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    #[tokio::test]
    async fn connect_and_exchange_bytes() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            stream.write_all(b"OK MPD 0.23.5\n").await.unwrap();
        });

        let connector = TcpConnector::new("127.0.0.1", port);
        let mut stream = connector.connect().await.unwrap();
        let mut buf = vec![0u8; 14];
        stream.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"OK MPD 0.23.5\n");

        server.await.unwrap();
    }

    #[tokio::test]
    async fn connection_refused_maps_to_connect_error() {
        // Bind then drop to obtain a port nobody listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = TcpConnector::new("127.0.0.1", port)
            .connect()
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Connect { .. }));
    }

    #[tokio::test]
    async fn empty_host_is_rejected() {
        let err = TcpConnector::new("", 6600).connect().await.unwrap_err();
        assert!(matches!(err, TransportError::InvalidAddress(_)));
    }

    #[test]
    fn transport_name_is_tcp() {
        assert_eq!(TcpConnector::default().transport_name(), "tcp");
    }

    #[test]
    fn display_formats_host_and_port() {
        assert_eq!(TcpConnector::default().to_string(), "localhost:6600");
        assert_eq!(TcpConnector::new("::1", 6601).to_string(), "[::1]:6601");
    }
}

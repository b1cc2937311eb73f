use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};

use tokio::net::UnixStream;
use tracing::debug;

use crate::error::{Result, TransportError};
use crate::traits::Connector;

/// Connects to a server listening on a filesystem-path Unix domain socket.
#[derive(Debug, Clone)]
pub struct UnixConnector {
    path: PathBuf,
}

impl UnixConnector {
    /// Maximum socket path length.
    /// Unix `sockaddr_un.sun_path` is typically 108 bytes on Linux, 104 on macOS.
    #[cfg(target_os = "linux")]
    const MAX_PATH_LEN: usize = 108;
    #[cfg(target_os = "macos")]
    const MAX_PATH_LEN: usize = 104;
    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    const MAX_PATH_LEN: usize = 104;

    /// Create a connector for the socket at `path`.
    ///
    /// The path length is validated up front so a misconfiguration fails
    /// once instead of on every reconnect attempt.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let len = path.as_os_str().len();
        if len >= Self::MAX_PATH_LEN {
            return Err(TransportError::PathTooLong {
                path,
                len,
                max: Self::MAX_PATH_LEN,
            });
        }
        Ok(Self { path })
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        "unix-domain-socket"
    }

    async fn open(&self) -> Result<UnixStream> {
        let stream =
            UnixStream::connect(&self.path)
                .await
                .map_err(|source| TransportError::ConnectUnix {
                    path: self.path.clone(),
                    source,
                })?;
        debug!(path = ?self.path, "connected to unix domain socket");
        Ok(stream)
    }
}

impl fmt::Display for UnixConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

impl Connector for UnixConnector {
    type Stream = UnixStream;

    fn connect(&self) -> impl Future<Output = Result<Self::Stream>> + Send {
        self.open()
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::UnixListener;

    use super::*;

    #[tokio::test]
    async fn connect_and_exchange_bytes() {
        let dir = std::env::temp_dir().join(format!("mpdwire-uds-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let sock_path = dir.join("mpd.sock");
        let _ = std::fs::remove_file(&sock_path);

        let listener = UnixListener::bind(&sock_path).unwrap();
        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            stream.write_all(b"OK MPD 0.24.0\n").await.unwrap();
        });

        let connector = UnixConnector::new(&sock_path).unwrap();
        let mut stream = connector.connect().await.unwrap();
        let mut buf = vec![0u8; 14];
        stream.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"OK MPD 0.24.0\n");

        server.await.unwrap();
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn missing_socket_maps_to_connect_error() {
        let connector = UnixConnector::new("/tmp/mpdwire-does-not-exist.sock").unwrap();
        let err = connector.connect().await.unwrap_err();
        assert!(matches!(err, TransportError::ConnectUnix { .. }));
    }

    #[test]
    fn test_path_too_long() {
        let long_path = "/tmp/".to_string() + &"a".repeat(200) + ".sock";
        let result = UnixConnector::new(&long_path);
        assert!(matches!(result, Err(TransportError::PathTooLong { .. })));
    }
}

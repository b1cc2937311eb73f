use std::fmt;
use std::str::FromStr;

use futures_util::{Stream, StreamExt};
use mpdwire_frame::{Frame, FrameError};
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

const MAX_VERSION_LEN: usize = 32;

/// Protocol version announced by the server, `<major>.<minor>[.<patch>]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServerVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl ServerVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for ServerVersion {
    type Err = ClientError;

    fn from_str(version: &str) -> Result<Self> {
        if version.is_empty() || version.len() > MAX_VERSION_LEN {
            return Err(ClientError::HandshakeFailed(format!(
                "invalid version length: {}",
                version.len()
            )));
        }

        let mut parts = version.split('.');
        let mut next = |label: &str, required: bool| -> Result<u32> {
            match parts.next() {
                Some(part) => part.parse::<u32>().map_err(|_| {
                    ClientError::HandshakeFailed(format!(
                        "invalid version '{version}': non-numeric {label}"
                    ))
                }),
                None if required => Err(ClientError::HandshakeFailed(format!(
                    "invalid version '{version}': missing {label}"
                ))),
                None => Ok(0),
            }
        };

        let major = next("major", true)?;
        let minor = next("minor", true)?;
        let patch = next("patch", false)?;

        if parts.next().is_some() {
            return Err(ClientError::HandshakeFailed(format!(
                "invalid version '{version}': expected '<major>.<minor>[.<patch>]'"
            )));
        }

        Ok(Self::new(major, minor, patch))
    }
}

/// What the server said when the connection opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeResult {
    /// Protocol name from the banner, `MPD` for a real server.
    pub protocol: String,
    /// Parsed protocol version, `None` when the server sends something other
    /// than `<major>.<minor>[.<patch>]`.
    pub version: Option<ServerVersion>,
    /// Version text exactly as sent.
    pub raw_version: String,
}

impl HandshakeResult {
    /// Accept a banner frame.
    ///
    /// Any version text is accepted. The only failure is a protocol name that
    /// differs from `expected_protocol`.
    pub fn from_banner(
        protocol: &str,
        version: &str,
        expected_protocol: Option<&str>,
    ) -> Result<Self> {
        if let Some(expected) = expected_protocol {
            if protocol != expected {
                return Err(ClientError::HandshakeFailed(format!(
                    "unknown protocol '{protocol}' (expected '{expected}')"
                )));
            }
        }

        Ok(Self {
            protocol: protocol.to_string(),
            version: version.parse().ok(),
            raw_version: version.to_string(),
        })
    }
}

/// Wait for the version banner that opens every connection.
///
/// The banner must be the first frame. Nothing is sent before it arrives.
pub(crate) async fn await_banner<S>(frames: &mut S, config: &ClientConfig) -> Result<HandshakeResult>
where
    S: Stream<Item = std::result::Result<Frame, FrameError>> + Unpin,
{
    let first = tokio::time::timeout(config.handshake_timeout, frames.next())
        .await
        .map_err(|_| ClientError::Timeout(config.handshake_timeout))?;

    match first {
        None => Err(ClientError::ConnectionLost(
            "connection closed during handshake".to_string(),
        )),
        Some(Err(err)) => Err(err.into()),
        Some(Ok(Frame::Version { protocol, version })) => {
            let result =
                HandshakeResult::from_banner(&protocol, &version, config.expected_protocol.as_deref())?;
            debug!(protocol = %result.protocol, version = %result.raw_version, "handshake complete");
            Ok(result)
        }
        Some(Ok(other)) => Err(ClientError::HandshakeFailed(format!(
            "expected version banner, got {} frame",
            other.kind()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures_util::stream;

    use super::*;

    fn banner(protocol: &str, version: &str) -> std::result::Result<Frame, FrameError> {
        Ok(Frame::Version {
            protocol: protocol.to_string(),
            version: version.to_string(),
        })
    }

    #[test]
    fn parses_two_and_three_part_versions() {
        assert_eq!("0.23.5".parse::<ServerVersion>().unwrap(), ServerVersion::new(0, 23, 5));
        assert_eq!("1.0".parse::<ServerVersion>().unwrap(), ServerVersion::new(1, 0, 0));
        assert!("1".parse::<ServerVersion>().is_err());
        assert!("1.x".parse::<ServerVersion>().is_err());
        assert!("1.2.3.4".parse::<ServerVersion>().is_err());
        assert!("".parse::<ServerVersion>().is_err());
    }

    #[test]
    fn versions_order_numerically() {
        let old: ServerVersion = "0.9.12".parse().unwrap();
        let new: ServerVersion = "0.21.0".parse().unwrap();
        assert!(old < new);
        assert_eq!(new.to_string(), "0.21.0");
    }

    #[tokio::test]
    async fn accepts_banner() {
        let mut frames = stream::iter(vec![banner("MPD", "0.23.5")]);
        let result = await_banner(&mut frames, &ClientConfig::default()).await.unwrap();
        assert_eq!(result.protocol, "MPD");
        assert_eq!(result.raw_version, "0.23.5");
        assert_eq!(result.version, Some(ServerVersion::new(0, 23, 5)));
    }

    #[tokio::test]
    async fn accepts_banner_with_free_form_version() {
        let mut frames = stream::iter(vec![banner("demo", "1.0.0-rc1")]);
        let result = await_banner(&mut frames, &ClientConfig::default()).await.unwrap();
        assert_eq!(result.protocol, "demo");
        assert_eq!(result.raw_version, "1.0.0-rc1");
        assert_eq!(result.version, None);
    }

    #[tokio::test]
    async fn accepts_long_protocol_name_without_expectation() {
        let protocol = "p".repeat(64);
        let mut frames = stream::iter(vec![banner(&protocol, "0.24")]);
        let result = await_banner(&mut frames, &ClientConfig::default()).await.unwrap();
        assert_eq!(result.protocol, protocol);
        assert_eq!(result.version, Some(ServerVersion::new(0, 24, 0)));
    }

    #[tokio::test]
    async fn rejects_unexpected_protocol() {
        let config = ClientConfig {
            expected_protocol: Some("MPD".to_string()),
            ..ClientConfig::default()
        };
        let mut frames = stream::iter(vec![banner("demo", "1.0.0")]);
        let err = await_banner(&mut frames, &config).await.unwrap_err();
        assert!(matches!(err, ClientError::HandshakeFailed(_)));
    }

    #[tokio::test]
    async fn rejects_data_before_banner() {
        let mut frames = stream::iter(vec![Ok(Frame::Data("volume: 5".to_string()))]);
        let err = await_banner(&mut frames, &ClientConfig::default()).await.unwrap_err();
        assert!(matches!(err, ClientError::HandshakeFailed(_)));
    }

    #[tokio::test]
    async fn closed_stream_is_connection_lost() {
        let mut frames = stream::iter(Vec::<std::result::Result<Frame, FrameError>>::new());
        let err = await_banner(&mut frames, &ClientConfig::default()).await.unwrap_err();
        assert!(matches!(err, ClientError::ConnectionLost(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn silent_server_times_out() {
        let config = ClientConfig {
            handshake_timeout: Duration::from_millis(50),
            ..ClientConfig::default()
        };
        let mut frames = stream::pending::<std::result::Result<Frame, FrameError>>();
        let err = await_banner(&mut frames, &config).await.unwrap_err();
        assert!(matches!(err, ClientError::Timeout(_)));
    }
}

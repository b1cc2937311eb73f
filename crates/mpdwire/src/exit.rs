use std::fmt;
use std::io;

use mpdwire_client::ClientError;
use mpdwire_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
/// The server answered with `ACK`.
pub const SERVER_ACK: i32 = 65;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::NotFound => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Connect { source, .. }
        | TransportError::ConnectUnix { source, .. }
        | TransportError::Io(source) => io_error(context, source),
        TransportError::ConnectTimeout { .. } => CliError::new(TIMEOUT, format!("{context}: {err}")),
        other @ (TransportError::PathTooLong { .. } | TransportError::InvalidAddress(_)) => {
            CliError::new(USAGE, format!("{context}: {other}"))
        }
    }
}

pub fn client_error(context: &str, err: ClientError) -> CliError {
    let code = match &err {
        ClientError::Protocol(_) => SERVER_ACK,
        ClientError::ConnectionLost(_) | ClientError::NotConnected => TRANSPORT_ERROR,
        ClientError::Decode(_) => DATA_INVALID,
        ClientError::Timeout(_) => TIMEOUT,
        ClientError::InvalidCommand(_) => USAGE,
        ClientError::HandshakeFailed(_) => FAILURE,
        ClientError::Closed => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mpdwire_client::ServerAck;

    use super::*;

    #[test]
    fn server_ack_has_its_own_code() {
        let ack = ServerAck::parse("[50@0] {play} No such song").expect("valid ack");
        let err = client_error("play failed", ClientError::Protocol(ack));
        assert_eq!(err.code, SERVER_ACK);
        assert!(err.message.starts_with("play failed: server error: No such song"));
    }

    #[test]
    fn timeouts_and_refusals_map_to_stable_codes() {
        let err = client_error("status failed", ClientError::Timeout(Duration::from_secs(1)));
        assert_eq!(err.code, TIMEOUT);

        let refused = io::Error::from(io::ErrorKind::ConnectionRefused);
        assert_eq!(io_error("connect", refused).code, TRANSPORT_ERROR);

        let invalid = TransportError::InvalidAddress("empty host".to_string());
        assert_eq!(transport_error("connect", invalid).code, USAGE);
    }
}

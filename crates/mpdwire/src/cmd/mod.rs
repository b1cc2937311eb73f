use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use mpdwire_client::{Client, ClientConfig, ExponentialBackoff};
use mpdwire_transport::TcpConnector;
use tracing::debug;

use crate::exit::{client_error, io_error, CliError, CliResult, TIMEOUT, USAGE};
use crate::output::OutputFormat;

pub mod batch;
pub mod info;
pub mod playlist;
pub mod send;
pub mod status;
pub mod version;
pub mod watch;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the player status.
    Status,
    /// Send a single command and print its reply.
    Send(SendArgs),
    /// Send several commands as one command list.
    Batch(BatchArgs),
    /// Print the queue, one row per song.
    Playlist,
    /// Print subsystem changes as they happen.
    Watch(WatchArgs),
    /// Probe the server and print connection metadata.
    Info,
    /// Show version information.
    Version(VersionArgs),
}

/// Where and how to connect, shared by every subcommand that talks to a server.
#[derive(Args, Debug, Clone)]
pub struct ConnectArgs {
    /// Server host name or address.
    #[arg(long, env = "MPD_HOST", default_value = "localhost", global = true)]
    pub host: String,
    /// Server TCP port.
    #[arg(long, env = "MPD_PORT", default_value_t = 6600, global = true)]
    pub port: u16,
    /// Connect through a Unix domain socket instead of TCP.
    #[arg(long, value_name = "PATH", global = true)]
    pub socket: Option<PathBuf>,
    /// Connect and reply timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s", global = true)]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Command name.
    pub name: String,
    /// Command arguments; each is quoted on the wire.
    pub args: Vec<String>,
    /// Decode the reply as a list of records instead of one.
    #[arg(long)]
    pub records: bool,
}

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// One command per flag, arguments separated by whitespace.
    #[arg(long = "command", short = 'c', value_name = "COMMAND", required = true)]
    pub commands: Vec<String>,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Only report these subsystems (repeatable).
    #[arg(long = "subsystem", short = 's', value_name = "NAME")]
    pub subsystems: Vec<String>,
    /// Exit after N changes.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn run(command: Command, conn: ConnectArgs, format: OutputFormat) -> CliResult<i32> {
    if let Command::Version(args) = command {
        return version::run(args);
    }

    let timeout = parse_duration(&conn.timeout)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| io_error("failed to start runtime", err))?;

    runtime.block_on(async move {
        match command {
            Command::Status => status::run(&conn, timeout, format).await,
            Command::Send(args) => send::run(args, &conn, timeout, format).await,
            Command::Batch(args) => batch::run(args, &conn, timeout, format).await,
            Command::Playlist => playlist::run(&conn, timeout, format).await,
            Command::Watch(args) => watch::run(args, &conn, timeout, format).await,
            Command::Info => info::run(&conn, timeout, format).await,
            Command::Version(args) => version::run(args),
        }
    })
}

/// Open a client for one CLI invocation.
///
/// Fails on the first unsuccessful attempt instead of retrying. One-shot
/// commands leave wait-mode off. `watch` passes the subsystems it follows and,
/// since it runs until interrupted, later reconnects back off exponentially.
pub async fn connect(
    conn: &ConnectArgs,
    timeout: Duration,
    idle_subsystems: Option<Vec<String>>,
) -> CliResult<Client> {
    let mut config = ClientConfig {
        handshake_timeout: timeout,
        command_timeout: Some(timeout),
        idle: idle_subsystems.is_some(),
        idle_subsystems: idle_subsystems.unwrap_or_default(),
        ..ClientConfig::default()
    };
    if config.idle {
        config = config.with_reconnect(ExponentialBackoff::default());
    }

    let attempt = match &conn.socket {
        Some(path) => connect_unix(path, config, timeout).await?,
        None => {
            let connector = tcp_connector(conn, timeout);
            debug!(transport = connector.transport_name(), addr = %connector, "connecting");
            tokio::time::timeout(timeout, Client::try_connect_with(connector, config)).await
        }
    };

    match attempt {
        Ok(Ok(client)) => Ok(client),
        Ok(Err(err)) => Err(client_error("connect failed", err)),
        Err(_) => Err(CliError::new(
            TIMEOUT,
            format!("connect timed out after {timeout:?}"),
        )),
    }
}

#[cfg(unix)]
async fn connect_unix(
    path: &std::path::Path,
    config: ClientConfig,
    timeout: Duration,
) -> CliResult<Result<mpdwire_client::Result<Client>, tokio::time::error::Elapsed>> {
    let connector = mpdwire_transport::UnixConnector::new(path)
        .map_err(|err| crate::exit::transport_error("invalid socket path", err))?;
    debug!(transport = connector.transport_name(), addr = %connector, "connecting");
    Ok(tokio::time::timeout(timeout, Client::try_connect_with(connector, config)).await)
}

#[cfg(not(unix))]
async fn connect_unix(
    _path: &std::path::Path,
    _config: ClientConfig,
    _timeout: Duration,
) -> CliResult<Result<mpdwire_client::Result<Client>, tokio::time::error::Elapsed>> {
    Err(CliError::new(
        USAGE,
        "--socket is only supported on Unix platforms",
    ))
}

fn tcp_connector(conn: &ConnectArgs, timeout: Duration) -> TcpConnector {
    TcpConnector::new(conn.host.clone(), conn.port).with_connect_timeout(Some(timeout))
}

/// Transport name and printable address of the server `conn` points at.
pub fn endpoint(conn: &ConnectArgs) -> CliResult<(&'static str, String)> {
    match &conn.socket {
        Some(path) => unix_endpoint(path),
        None => {
            let connector = TcpConnector::new(conn.host.clone(), conn.port);
            Ok((connector.transport_name(), connector.to_string()))
        }
    }
}

#[cfg(unix)]
fn unix_endpoint(path: &std::path::Path) -> CliResult<(&'static str, String)> {
    let connector = mpdwire_transport::UnixConnector::new(path)
        .map_err(|err| crate::exit::transport_error("invalid socket path", err))?;
    Ok((connector.transport_name(), connector.to_string()))
}

#[cfg(not(unix))]
fn unix_endpoint(_path: &std::path::Path) -> CliResult<(&'static str, String)> {
    Err(CliError::new(
        USAGE,
        "--socket is only supported on Unix platforms",
    ))
}

/// Split `name arg arg` on whitespace.
pub fn parse_command_line(input: &str) -> CliResult<mpdwire_client::Command> {
    let mut parts = input.split_whitespace();
    let name = parts
        .next()
        .ok_or_else(|| CliError::new(USAGE, "command must not be empty"))?;
    Ok(mpdwire_client::Command::new(name).args(parts))
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_units() {
        assert_eq!(parse_duration("5s").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_duration("2").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
    }

    #[test]
    fn parse_duration_invalid() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration("").is_err());
    }

    fn args(host: &str, socket: Option<&str>) -> ConnectArgs {
        ConnectArgs {
            host: host.to_string(),
            port: 6600,
            socket: socket.map(PathBuf::from),
            timeout: "5s".to_string(),
        }
    }

    #[test]
    fn endpoint_names_transport_and_address() {
        let (transport, address) = endpoint(&args("::1", None)).unwrap();
        assert_eq!(transport, "tcp");
        assert_eq!(address, "[::1]:6600");
    }

    #[cfg(unix)]
    #[test]
    fn endpoint_prefers_socket_path() {
        let (transport, address) = endpoint(&args("localhost", Some("/run/mpd/socket"))).unwrap();
        assert_eq!(transport, "unix-domain-socket");
        assert_eq!(address, "/run/mpd/socket");
    }

    #[test]
    fn command_line_splits_on_whitespace() {
        let cmd = parse_command_line("  find artist  Miles ").unwrap();
        assert_eq!(cmd.name(), "find");
        assert_eq!(cmd.arguments(), ["artist", "Miles"]);
        assert!(parse_command_line("   ").is_err());
    }
}

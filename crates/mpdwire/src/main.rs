mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::{Command, ConnectArgs};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "mpdwire", version, about = "Music Player Daemon protocol client")]
struct Cli {
    #[command(flatten)]
    conn: ConnectArgs,

    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, cli.conn, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_send_subcommand() {
        let cli = Cli::try_parse_from([
            "mpdwire", "--host", "music.local", "send", "find", "artist", "Miles Davis", "--records",
        ])
        .expect("send args should parse");

        assert_eq!(cli.conn.host, "music.local");
        match cli.command {
            Command::Send(args) => {
                assert_eq!(args.name, "find");
                assert_eq!(args.args, ["artist", "Miles Davis"]);
                assert!(args.records);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn connection_flags_are_global() {
        let cli = Cli::try_parse_from(["mpdwire", "status", "--port", "6601", "--timeout", "500ms"])
            .expect("status args should parse");
        assert_eq!(cli.conn.port, 6601);
        assert_eq!(cli.conn.timeout, "500ms");
        assert!(matches!(cli.command, Command::Status));
    }

    #[test]
    fn batch_requires_a_command() {
        let err = Cli::try_parse_from(["mpdwire", "batch"]).expect_err("missing -c should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn parses_watch_filters() {
        let cli = Cli::try_parse_from(["mpdwire", "watch", "-s", "player", "-s", "mixer", "--count", "2"])
            .expect("watch args should parse");
        match cli.command {
            Command::Watch(args) => {
                assert_eq!(args.subsystems, ["player", "mixer"]);
                assert_eq!(args.count, Some(2));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}

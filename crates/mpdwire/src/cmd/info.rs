use std::time::{Duration, Instant};

use mpdwire_client::Command;
use serde::Serialize;
use tracing::warn;

use crate::cmd::{connect, endpoint, ConnectArgs};
use crate::exit::{CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_json, OutputFormat};

#[derive(Serialize)]
struct InfoOutput {
    transport: &'static str,
    address: String,
    protocol: String,
    version: Option<String>,
    raw_version: String,
    ping_latency_ms: Option<f64>,
    ping_error: Option<String>,
    connected: bool,
}

pub async fn run(conn: &ConnectArgs, timeout: Duration, format: OutputFormat) -> CliResult<i32> {
    let (transport, address) = endpoint(conn)?;
    let client = connect(conn, timeout, None).await?;
    let handshake = client.server_version();

    let started = Instant::now();
    let (ping_latency_ms, ping_error) = match client.send_command(&Command::new("ping")).await {
        Ok(_) => (
            Some((started.elapsed().as_secs_f64() * 1000.0 * 100.0).round() / 100.0),
            None,
        ),
        Err(err) => {
            warn!(error = %err, "ping failed");
            (None, Some(err.to_string()))
        }
    };
    let connected = ping_error.is_none();
    client.close().await;

    let handshake =
        handshake.ok_or_else(|| CliError::new(INTERNAL, "connected without a handshake result"))?;

    let out = InfoOutput {
        transport,
        address,
        protocol: handshake.protocol,
        version: handshake.version.map(|version| version.to_string()),
        raw_version: handshake.raw_version,
        ping_latency_ms,
        ping_error,
        connected,
    };

    print_info(&out, format);
    Ok(SUCCESS)
}

fn print_info(out: &InfoOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(out),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("Connection Info:");
            println!("  Transport: {}", out.transport);
            println!("  Address:   {}", out.address);
            println!("  Protocol:  {} {}", out.protocol, out.raw_version);
            match (out.ping_latency_ms, &out.ping_error) {
                (Some(ms), _) => println!("  Ping:      {ms:.2}ms"),
                (None, Some(err)) => println!("  Ping:      failed ({err})"),
                (None, None) => println!("  Ping:      unavailable"),
            }
        }
        OutputFormat::Raw => {
            println!("{}", out.raw_version);
        }
    }
}

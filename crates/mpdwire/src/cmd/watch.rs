use std::time::Duration;

use tracing::{info, warn};

use crate::cmd::{connect, ConnectArgs, WatchArgs};
use crate::exit::{client_error, io_error, CliResult, SUCCESS};
use crate::output::{print_change, OutputFormat};

pub async fn run(
    args: WatchArgs,
    conn: &ConnectArgs,
    timeout: Duration,
    format: OutputFormat,
) -> CliResult<i32> {
    let client = connect(conn, timeout, Some(args.subsystems.clone())).await?;
    let mut changes = client.subsystem_events();
    let mut lifecycle = client.connection_events();
    info!(subsystems = ?args.subsystems, "watching for changes");

    let mut seen = 0usize;
    let result = loop {
        if args.count.is_some_and(|count| seen >= count) {
            break Ok(SUCCESS);
        }

        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                break signal.map(|()| SUCCESS).map_err(|err| io_error("signal handler failed", err));
            }
            change = changes.recv() => match change {
                Ok(name) => {
                    print_change(&name, format);
                    seen += 1;
                }
                Err(err) => break Err(client_error("watch failed", err)),
            },
            event = lifecycle.recv() => match event {
                Ok(mpdwire_client::ConnectionEvent::Error { reason }) => {
                    warn!(%reason, "connection lost, reconnecting");
                }
                Ok(_) => {}
                Err(err) => break Err(client_error("watch failed", err)),
            },
        }
    };

    client.close().await;
    result
}

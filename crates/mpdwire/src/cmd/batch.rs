use std::time::Duration;

use mpdwire_client::CommandList;

use crate::cmd::send::print_payload;
use crate::cmd::{connect, parse_command_line, BatchArgs, ConnectArgs};
use crate::exit::{client_error, CliResult, SUCCESS};
use crate::output::OutputFormat;

pub async fn run(
    args: BatchArgs,
    conn: &ConnectArgs,
    timeout: Duration,
    format: OutputFormat,
) -> CliResult<i32> {
    let mut list = CommandList::new();
    for line in &args.commands {
        list.push(parse_command_line(line)?);
    }

    let client = connect(conn, timeout, None).await?;
    let result = client.send_commands(&list).await;
    client.close().await;

    let payload = result.map_err(|err| client_error("command list failed", err))?;
    print_payload(&payload, true, format)?;
    Ok(SUCCESS)
}

use std::time::Duration;

use mpdwire_client::Command;
use mpdwire_frame::{parse_record, parse_records, RecordError};

use crate::cmd::{connect, ConnectArgs, SendArgs};
use crate::exit::{client_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_raw, print_record, print_records, OutputFormat};

pub async fn run(
    args: SendArgs,
    conn: &ConnectArgs,
    timeout: Duration,
    format: OutputFormat,
) -> CliResult<i32> {
    let command = Command::new(args.name.as_str()).args(args.args);

    let client = connect(conn, timeout, None).await?;
    let result = client.send_command(&command).await;
    client.close().await;

    let payload = result.map_err(|err| client_error(&format!("{} failed", args.name), err))?;
    print_payload(&payload, args.records, format)?;
    Ok(SUCCESS)
}

/// Decode and print a reply payload. `raw` output skips decoding.
pub fn print_payload(payload: &str, records: bool, format: OutputFormat) -> CliResult<()> {
    if matches!(format, OutputFormat::Raw) {
        print_raw(payload);
        return Ok(());
    }

    let invalid = |err: RecordError| CliError::new(DATA_INVALID, format!("could not decode reply: {err}"));
    if records {
        let decoded = parse_records(payload).map_err(invalid)?;
        print_records(&decoded, format);
    } else {
        let decoded = parse_record(payload).map_err(invalid)?;
        print_record(&decoded, format);
    }
    Ok(())
}

use std::time::Duration;

use crate::cmd::{connect, ConnectArgs};
use crate::exit::{client_error, CliResult, SUCCESS};
use crate::output::{print_record, OutputFormat};

pub async fn run(conn: &ConnectArgs, timeout: Duration, format: OutputFormat) -> CliResult<i32> {
    let client = connect(conn, timeout, None).await?;
    let result = client.status().await;
    client.close().await;

    let status = result.map_err(|err| client_error("status failed", err))?;
    print_record(&status, format);
    Ok(SUCCESS)
}

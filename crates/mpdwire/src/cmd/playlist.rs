use std::time::Duration;

use crate::cmd::{connect, ConnectArgs};
use crate::exit::{client_error, CliResult, SUCCESS};
use crate::output::{print_records, OutputFormat};

pub async fn run(conn: &ConnectArgs, timeout: Duration, format: OutputFormat) -> CliResult<i32> {
    let client = connect(conn, timeout, None).await?;
    let result = client.playlist_songs().await;
    client.close().await;

    let songs = result.map_err(|err| client_error("playlistinfo failed", err))?;
    print_records(&songs, format);
    Ok(SUCCESS)
}

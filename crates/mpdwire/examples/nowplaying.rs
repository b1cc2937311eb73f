//! Print the current song whenever the player changes.
//!
//! Run with:
//!   cargo run --example nowplaying -- raspberrypi.local 6600

use mpdwire::client::{Client, ClientError};

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    let mut args = std::env::args().skip(1);
    let host = args.next().unwrap_or_else(|| "localhost".to_string());
    let port = args.next().and_then(|p| p.parse().ok()).unwrap_or(6600);

    let client = Client::connect(host, port).await?;
    if let Some(server) = client.server_version() {
        eprintln!("connected to {} {}", server.protocol, server.raw_version);
    }

    let status = client.status().await?;
    println!("state: {}", status.get("state").map(String::as_str).unwrap_or("?"));

    let mut player = client.subscribe_subsystem("player");
    loop {
        player.recv().await?;
        let song = client.current_song().await?;
        println!(
            "{} - {}",
            song.get("Artist").map(String::as_str).unwrap_or("unknown artist"),
            song.get("Title").map(String::as_str).unwrap_or("untitled"),
        );
    }
}

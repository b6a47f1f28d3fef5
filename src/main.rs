use std::path::PathBuf;
use std::time::Duration;

use bercon::client::RconClient;
use bercon::session::LoginCredentials;
use bercon::sink::ConsoleSink;
use bercon::RconHandle;
use clap::Parser;
use log::{info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server RCON port
    #[arg(short, long, default_value = "2302")]
    port: u16,

    /// RCON password
    #[arg(short = 'P', long)]
    password: String,

    /// File of commands to run instead of the interactive console,
    /// e.g. scripted restart warnings. An empty line sleeps one second.
    #[arg(short, long)]
    file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let credentials = LoginCredentials {
        address: args.host,
        port: args.port,
        password: args.password,
    };
    info!("Connecting to {}:{}", credentials.address, credentials.port);

    let mut client = RconClient::connect(credentials, Box::new(ConsoleSink)).await?;
    let handle = client.handle();

    let session = tokio::spawn(async move { client.run().await });

    match args.file {
        Some(path) => run_batch(&handle, &path).await?,
        None => run_console(&handle).await?,
    }

    handle.disconnect();
    session.await??;
    Ok(())
}

/// Feeds commands from a file, one per line. Empty lines pause for a
/// second so scripts can space out restart warnings.
async fn run_batch(handle: &RconHandle, path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let contents = tokio::fs::read_to_string(path).await?;
    for line in contents.lines() {
        if line.is_empty() {
            tokio::time::sleep(Duration::from_secs(1)).await;
        } else {
            info!("> {}", line);
            handle.command(line);
        }
    }
    Ok(())
}

/// Interactive console: `quit` exits, `players` and `missions` run the
/// structured queries, anything else is sent as a raw command.
async fn run_console(handle: &RconHandle) -> Result<(), Box<dyn std::error::Error>> {
    println!("Type commands to send them to the server.");
    println!("  players   list connected players");
    println!("  missions  list available missions");
    println!("  quit      disconnect and exit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut next_id: u32 = 1;

    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        match input {
            "" => {}
            "quit" => {
                info!("Quitting, waiting for the queue to drain");
                break;
            }
            "players" => {
                handle.players(input, next_id);
                next_id = next_id.wrapping_add(1);
            }
            "missions" => {
                handle.missions(input, next_id);
                next_id = next_id.wrapping_add(1);
            }
            command => {
                if !handle.is_logged_in() {
                    warn!("not logged in yet, command may be dropped");
                }
                handle.command(command);
            }
        }
    }
    Ok(())
}

//! notiline - command-line client for the notiline daemon
//!
//! # Usage
//!
//! ```bash
//! # Print the status line whenever it changes (e.g. for a bar module)
//! notiline watch
//!
//! # Print the current status line once
//! notiline current
//!
//! # Navigate
//! notiline send prevmsg
//! notiline send dismiss
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use notiline_core::NavCommand;
use notiline_protocol::{ClientLine, Config};

/// notiline client - watch and steer the notification status line
#[derive(Parser, Debug)]
#[command(name = "notiline", version, about)]
struct Args {
    /// Daemon address (default: from the daemon's config)
    #[arg(short, long, global = true)]
    addr: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send one navigation command
    /// (nextmsg, prevmsg, nextnotif, prevnotif, dismiss, dismissall, hide, hideall)
    Send { command: NavCommand },
    /// Print every status line as it changes
    Watch,
    /// Print the current status line and exit
    Current,
}

fn daemon_addr(explicit: Option<String>) -> Result<String> {
    if let Some(addr) = explicit {
        return Ok(addr);
    }
    let mut config = Config::load(None).context("Failed to load configuration")?;
    config.apply_env().context("Invalid environment override")?;
    Ok(config.listen_addr)
}

async fn connect(addr: &str) -> Result<TcpStream> {
    TcpStream::connect(addr)
        .await
        .with_context(|| format!("Failed to connect to notilined at {addr}"))
}

async fn send(addr: &str, command: NavCommand) -> Result<()> {
    let mut stream = connect(addr).await?;
    let line = ClientLine::Command(command).encode();
    stream
        .write_all(line.as_bytes())
        .await
        .context("Failed to send command")?;
    stream.shutdown().await.context("Failed to close connection")?;
    Ok(())
}

/// Subscribes and prints status lines; stops after the first if `once`.
async fn watch(addr: &str, once: bool) -> Result<()> {
    let stream = connect(addr).await?;
    let (reader, mut writer) = stream.into_split();

    writer
        .write_all(ClientLine::Subscribe.encode().as_bytes())
        .await
        .context("Failed to subscribe")?;

    let mut lines = BufReader::new(reader).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => return Ok(()),
            line = lines.next_line() => {
                match line.context("Connection to notilined failed")? {
                    Some(status) => {
                        println!("{status}");
                        if once {
                            return Ok(());
                        }
                    }
                    None => return Ok(()),
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let addr = daemon_addr(args.addr)?;

    match args.command {
        Command::Send { command } => send(&addr, command).await,
        Command::Watch => watch(&addr, false).await,
        Command::Current => watch(&addr, true).await,
    }
}

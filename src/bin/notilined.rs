//! notiline daemon - desktop notification arbiter and status server
//!
//! Claims `org.freedesktop.Notifications` on the session bus, decides which
//! notification occupies the status line, and streams that line to every
//! subscribed TCP client.
//!
//! # Usage
//!
//! ```bash
//! # Start the daemon (foreground)
//! notilined start
//!
//! # Start the daemon (background/daemonized)
//! notilined start -d
//!
//! # Stop the daemon
//! notilined stop
//!
//! # Check daemon status
//! notilined status
//!
//! # Listen elsewhere, with a shorter default timeout
//! NOTILINE_LISTEN=127.0.0.1:9000 notilined start --default-timeout 5
//!
//! # Enable debug logging
//! RUST_LOG=notilined=debug notilined start
//! ```
//!
//! # Signal Handling
//!
//! - SIGTERM/SIGINT: Graceful shutdown

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::PathBuf;
use std::process;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use notiline_protocol::Config;
use notilined::broadcast::spawn_broadcaster;
use notilined::dbus;
use notilined::server::DaemonServer;
use notilined::store::spawn_store;

/// notiline daemon - single-line notification status server
#[derive(Parser, Debug)]
#[command(name = "notilined", version, about)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the daemon
    Start {
        /// Run as a background daemon (fork to background)
        #[arg(short = 'd', long)]
        daemon: bool,

        /// Config file (default: $XDG_CONFIG_HOME/notiline/config.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Address for the subscriber listener
        #[arg(short, long)]
        listen: Option<String>,

        /// Seconds a notification stays up when it asks for the default
        #[arg(long)]
        default_timeout: Option<u32>,

        /// Do not claim the notification service on the session bus
        #[arg(long)]
        no_dbus: bool,
    },
    /// Stop the running daemon
    Stop,
    /// Show daemon status
    Status,
}

fn state_dir() -> PathBuf {
    dirs::state_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("notiline")
}

fn pid_file_path() -> PathBuf {
    state_dir().join("notilined.pid")
}

fn log_file_path() -> PathBuf {
    state_dir().join("notilined.log")
}

/// Reads the PID from the PID file, if it exists.
fn read_pid() -> Option<u32> {
    let mut file = File::open(pid_file_path()).ok()?;
    let mut contents = String::new();
    file.read_to_string(&mut contents).ok()?;
    contents.trim().parse().ok()
}

fn write_pid() -> Result<()> {
    let path = pid_file_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create state directory")?;
    }
    let mut file = File::create(&path).context("Failed to create PID file")?;
    write!(file, "{}", process::id()).context("Failed to write PID")?;
    Ok(())
}

fn remove_pid_file() {
    let _ = fs::remove_file(pid_file_path());
}

fn is_process_running(pid: u32) -> bool {
    PathBuf::from(format!("/proc/{pid}")).exists()
}

/// Returns the PID of a running daemon, clearing a stale PID file.
fn is_daemon_running() -> Option<u32> {
    if let Some(pid) = read_pid() {
        if is_process_running(pid) {
            return Some(pid);
        }
        remove_pid_file();
    }
    None
}

/// Sends SIGTERM to the daemon process.
fn stop_daemon(pid: u32) -> Result<()> {
    #[cfg(unix)]
    {
        let Ok(raw) = i32::try_from(pid) else {
            bail!("Invalid PID {pid}");
        };
        let result = unsafe { libc::kill(raw, libc::SIGTERM) };
        if result != 0 {
            bail!("Failed to send SIGTERM to process {pid}");
        }
    }
    #[cfg(not(unix))]
    {
        bail!("Stop command is only supported on Unix systems");
    }
    Ok(())
}

/// Builds the effective configuration: file, then environment, then flags.
fn load_config(
    path: Option<PathBuf>,
    listen: Option<String>,
    default_timeout: Option<u32>,
    no_dbus: bool,
) -> Result<Config> {
    let mut config = Config::load(path.as_deref()).context("Failed to load configuration")?;
    config
        .apply_env()
        .context("Invalid environment override")?;

    if let Some(listen) = listen {
        config.listen_addr = listen;
    }
    if let Some(secs) = default_timeout {
        config.default_timeout_secs = secs;
    }
    if no_dbus {
        config.dbus = false;
    }
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let command = args.command.unwrap_or(Command::Start {
        daemon: false,
        config: None,
        listen: None,
        default_timeout: None,
        no_dbus: false,
    });

    match command {
        Command::Start {
            daemon,
            config,
            listen,
            default_timeout,
            no_dbus,
        } => {
            if let Some(pid) = is_daemon_running() {
                eprintln!("Daemon is already running (PID {pid})");
                eprintln!("Use 'notilined stop' to stop it first.");
                process::exit(1);
            }

            let config = load_config(config, listen, default_timeout, no_dbus)?;

            if daemon {
                // Must happen before the tokio runtime starts.
                daemonize()?;
            }

            write_pid()?;
            let result = run_daemon(config);
            remove_pid_file();

            result
        }
        Command::Stop => {
            if let Some(pid) = is_daemon_running() {
                println!("Stopping daemon (PID {pid})...");
                stop_daemon(pid)?;

                for _ in 0..50 {
                    if !is_process_running(pid) {
                        println!("Daemon stopped.");
                        return Ok(());
                    }
                    std::thread::sleep(std::time::Duration::from_millis(100));
                }

                eprintln!("Daemon did not stop within 5 seconds.");
                process::exit(1);
            } else {
                println!("Daemon is not running.");
                Ok(())
            }
        }
        Command::Status => {
            if let Some(pid) = is_daemon_running() {
                println!("Daemon is running (PID {pid})");
                if let Ok(config) = load_config(None, None, None, false) {
                    println!("Listening on: {}", config.listen_addr);
                }
                Ok(())
            } else {
                println!("Daemon is not running.");
                process::exit(1);
            }
        }
    }
}

fn daemonize() -> Result<()> {
    use daemonize::Daemonize;

    let log_path = log_file_path();
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent).context("Failed to create log directory")?;
    }

    let stdout = File::create(&log_path).context("Failed to create log file for stdout")?;
    let stderr = stdout
        .try_clone()
        .context("Failed to create log file for stderr")?;

    Daemonize::new()
        .working_directory("/")
        .stdout(stdout)
        .stderr(stderr)
        .start()
        .context("Failed to daemonize")?;

    Ok(())
}

#[tokio::main]
async fn run_daemon(config: Config) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("notilined=info".parse()?)
                .add_directive("notiline_core=info".parse()?),
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = process::id(),
        listen = %config.listen_addr,
        default_timeout_secs = config.default_timeout_secs,
        "notiline daemon starting"
    );

    let cancel_token = CancellationToken::new();

    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        if let Err(e) = wait_for_shutdown_signal().await {
            error!(error = %e, "Error waiting for shutdown signal");
        }
        info!("Shutdown signal received");
        shutdown_token.cancel();
    });

    let broadcaster = spawn_broadcaster(config.max_subscribers);
    let store = spawn_store(config.default_timeout_secs, broadcaster.clone());
    info!("Notification store started");

    let server = DaemonServer::bind(
        &config.listen_addr,
        store.clone(),
        broadcaster,
        cancel_token.clone(),
    )
    .await?;

    if config.dbus {
        let dbus_token = cancel_token.clone();
        tokio::spawn(async move {
            if let Err(e) = dbus::serve(store, dbus_token.clone()).await {
                error!(error = %e, "Session bus ingress failed, shutting down");
                dbus_token.cancel();
            }
        });
    } else {
        info!("Session bus ingress disabled");
    }

    if let Err(e) = server.run().await {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("notiline daemon stopped");
    Ok(())
}

/// Waits for a shutdown signal (SIGTERM or SIGINT).
async fn wait_for_shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM"),
            _ = sigint.recv() => info!("Received SIGINT"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl+C");
    }

    Ok(())
}

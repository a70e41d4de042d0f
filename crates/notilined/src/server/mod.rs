//! Line-based TCP server for subscribers and remote commands.
//!
//! The server:
//! - Listens on a TCP address (`127.0.0.1:8082` by default)
//! - Spawns a ConnectionHandler for each client
//! - Supports graceful shutdown via CancellationToken
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   DaemonServer  │
//! │   TcpListener   │
//! └───────┬─────────┘
//!         │ accept()
//!         ▼
//! ┌─────────────────┐  navigate  ┌─────────────────┐
//! │ConnectionHandler│──────────▶│   StoreHandle   │
//! │   (per client)  │            └─────────────────┘
//! └───────┬─────────┘
//!         │ subscribe / unsubscribe
//!         ▼
//! ┌─────────────────┐
//! │BroadcasterHandle│
//! └─────────────────┘
//! ```

mod connection;

pub use connection::{ConnectionError, ConnectionHandler};

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::broadcast::BroadcasterHandle;
use crate::store::StoreHandle;

/// TCP server for the notiline daemon.
pub struct DaemonServer {
    listener: TcpListener,
    store: StoreHandle,
    broadcaster: BroadcasterHandle,
    cancel_token: CancellationToken,

    /// Connection counter for generating subscriber ids
    connection_counter: AtomicU64,
}

impl DaemonServer {
    /// Binds the listener.
    ///
    /// Binding happens up front so that address errors surface before the
    /// daemon reports itself as started.
    pub async fn bind(
        addr: &str,
        store: StoreHandle,
        broadcaster: BroadcasterHandle,
        cancel_token: CancellationToken,
    ) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.to_string(),
                error: e.to_string(),
            })?;

        Ok(Self {
            listener,
            store,
            broadcaster,
            cancel_token,
            connection_counter: AtomicU64::new(0),
        })
    }

    /// The address actually bound (useful with port 0).
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        self.listener
            .local_addr()
            .map_err(|e| ServerError::Io(e.to_string()))
    }

    /// Accepts connections until the cancellation token is triggered.
    pub async fn run(self) -> Result<(), ServerError> {
        if let Ok(addr) = self.listener.local_addr() {
            info!(addr = %addr, "Daemon server listening");
        }

        loop {
            tokio::select! {
                _ = self.cancel_token.cancelled() => {
                    info!("Server shutdown requested");
                    break;
                }

                result = self.listener.accept() => {
                    match result {
                        Ok((stream, peer)) => {
                            let id = self.connection_counter.fetch_add(1, Ordering::Relaxed);
                            info!(connection = id, peer = %peer, "Accepted connection");
                            self.handle_connection(stream, id);
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to accept connection");
                        }
                    }
                }
            }
        }

        info!("Server stopped");
        Ok(())
    }

    fn handle_connection(&self, stream: TcpStream, connection_id: u64) {
        let (reader, writer) = stream.into_split();
        let handler = ConnectionHandler::new(
            reader,
            writer,
            self.store.clone(),
            self.broadcaster.clone(),
            self.cancel_token.child_token(),
            connection_id,
        );

        tokio::spawn(handler.run());
    }
}

/// Errors that can occur in server operations.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {error}")]
    Bind { addr: String, error: String },

    #[error("I/O error: {0}")]
    Io(String),
}

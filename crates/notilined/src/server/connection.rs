//! Connection handler for individual client connections.
//!
//! Each TCP connection gets its own `ConnectionHandler` that:
//! - Reads newline-terminated lines (at most `MAX_LINE_LEN` bytes each)
//! - Subscribes the connection to display updates on `sub`
//! - Forwards every other recognized line to the store as a navigation command
//! - Writes display strings to the client while subscribed
//!
//! # Panic-Free Guarantees
//!
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Connection errors are logged and result in graceful disconnect

use std::time::Duration;

use futures::StreamExt;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::watch;
use tokio::time::timeout;
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use notiline_protocol::{parse_line, ClientLine, StatusFrame, MAX_LINE_LEN};

use crate::broadcast::{BroadcastError, BroadcasterHandle, SubscriberId};
use crate::store::StoreHandle;

/// Write timeout (10 seconds)
const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection handler for a single client.
pub struct ConnectionHandler {
    lines: FramedRead<OwnedReadHalf, LinesCodec>,
    writer: BufWriter<OwnedWriteHalf>,
    store: StoreHandle,
    broadcaster: BroadcasterHandle,
    cancel_token: CancellationToken,

    /// Display updates, present while subscribed.
    updates: Option<watch::Receiver<String>>,

    /// Connection number, doubling as the subscriber id.
    connection_id: SubscriberId,
}

impl ConnectionHandler {
    pub fn new(
        reader: OwnedReadHalf,
        writer: OwnedWriteHalf,
        store: StoreHandle,
        broadcaster: BroadcasterHandle,
        cancel_token: CancellationToken,
        connection_id: SubscriberId,
    ) -> Self {
        Self {
            lines: FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_LINE_LEN)),
            writer: BufWriter::new(writer),
            store,
            broadcaster,
            cancel_token,
            updates: None,
            connection_id,
        }
    }

    /// Serves the connection until the client leaves, an error occurs, or
    /// the server shuts down.
    pub async fn run(mut self) {
        debug!(connection = self.connection_id, "New client connected");

        match self.process().await {
            Ok(()) => debug!(connection = self.connection_id, "Client disconnected"),
            Err(e) => debug!(
                connection = self.connection_id,
                error = %e,
                "Connection closed"
            ),
        }

        if self.updates.take().is_some() {
            self.broadcaster.unsubscribe(self.connection_id);
        }
    }

    async fn process(&mut self) -> Result<(), ConnectionError> {
        loop {
            tokio::select! {
                _ = self.cancel_token.cancelled() => return Ok(()),

                line = self.lines.next() => match line {
                    Some(Ok(line)) => self.handle_line(&line).await?,
                    Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                        warn!(
                            connection = self.connection_id,
                            max = MAX_LINE_LEN,
                            "Line too long, closing connection"
                        );
                        return Err(ConnectionError::LineTooLong { max: MAX_LINE_LEN });
                    }
                    Some(Err(LinesCodecError::Io(e))) => {
                        return Err(ConnectionError::Io(e.to_string()));
                    }
                    None => return Ok(()),
                },

                Some(status) = recv_update(&mut self.updates) => {
                    self.send_status(&status).await?;
                }
            }
        }
    }

    async fn handle_line(&mut self, raw: &str) -> Result<(), ConnectionError> {
        let line = parse_line(raw).map_err(|e| ConnectionError::Protocol(e.to_string()))?;

        match line {
            ClientLine::Subscribe => self.subscribe().await,
            ClientLine::Command(command) => {
                debug!(connection = self.connection_id, command = %command, "Remote command");
                self.store
                    .navigate(command)
                    .await
                    .map_err(|e| ConnectionError::Store(e.to_string()))
            }
            ClientLine::Ignored(token) => {
                if !token.is_empty() {
                    debug!(connection = self.connection_id, token = %token, "Unknown command ignored");
                }
                Ok(())
            }
        }
    }

    async fn subscribe(&mut self) -> Result<(), ConnectionError> {
        if self.updates.is_some() {
            debug!(connection = self.connection_id, "Already subscribed");
            return Ok(());
        }

        let (sink, updates) = watch::channel(String::new());
        match self.broadcaster.subscribe(self.connection_id, sink).await {
            Ok(()) => {
                info!(connection = self.connection_id, "Client subscribed to status updates");
                self.updates = Some(updates);
                Ok(())
            }
            Err(BroadcastError::TooManySubscribers { max }) => {
                warn!(
                    connection = self.connection_id,
                    max,
                    "Subscription refused, connection stays command-only"
                );
                Ok(())
            }
            Err(e @ BroadcastError::ChannelClosed) => Err(ConnectionError::Broadcast(e.to_string())),
        }
    }

    async fn send_status(&mut self, status: &str) -> Result<(), ConnectionError> {
        let frame = StatusFrame::new(status).to_line();
        let writer = &mut self.writer;

        match timeout(WRITE_TIMEOUT, async {
            writer.write_all(frame.as_bytes()).await?;
            writer.flush().await?;
            Ok::<(), std::io::Error>(())
        })
        .await
        {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(ConnectionError::Io(e.to_string())),
            Err(_) => Err(ConnectionError::WriteTimeout),
        }
    }
}

/// Newest display update, or never when not subscribed.
///
/// Updates published while a write is in flight collapse into one.
async fn recv_update(updates: &mut Option<watch::Receiver<String>>) -> Option<String> {
    match updates {
        Some(rx) => match rx.changed().await {
            Ok(()) => Some(rx.borrow_and_update().clone()),
            Err(_) => None,
        },
        None => std::future::pending().await,
    }
}

/// Errors that can occur during connection handling.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("Line too long (max: {max} bytes)")]
    LineTooLong { max: usize },

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Write timeout")]
    WriteTimeout,

    #[error("Store error: {0}")]
    Store(String),

    #[error("Broadcaster error: {0}")]
    Broadcast(String),
}

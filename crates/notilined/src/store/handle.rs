//! Client interface for interacting with the StoreActor.
//!
//! # Panic-Free Guarantees
//!
//! Channel errors are mapped to `StoreError::ChannelClosed`; nothing here
//! unwraps.

use tokio::sync::{mpsc, oneshot};

use notiline_core::{NavCommand, NotificationId};

use super::commands::{NotifyRequest, StoreCommand, StoreError, StoreSnapshot};

/// Handle for interacting with the store actor.
///
/// Cheap to clone; every ingress adapter holds its own copy.
#[derive(Clone, Debug)]
pub struct StoreHandle {
    sender: mpsc::Sender<StoreCommand>,
}

impl StoreHandle {
    pub fn new(sender: mpsc::Sender<StoreCommand>) -> Self {
        Self { sender }
    }

    /// Create or update a notification and wait for its id.
    ///
    /// # Errors
    ///
    /// - `StoreError::ChannelClosed` if the actor has shut down
    pub async fn notify(&self, request: NotifyRequest) -> Result<NotificationId, StoreError> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(StoreCommand::Notify {
                request: Box::new(request),
                respond_to: tx,
            })
            .await
            .map_err(|_| StoreError::ChannelClosed)?;

        rx.await.map_err(|_| StoreError::ChannelClosed)
    }

    /// Mark a notification as seen. Unknown ids are silently ignored.
    pub async fn close(&self, id: u32) -> Result<(), StoreError> {
        self.sender
            .send(StoreCommand::Close { id })
            .await
            .map_err(|_| StoreError::ChannelClosed)
    }

    /// Forward a remote navigation command.
    pub async fn navigate(&self, command: NavCommand) -> Result<(), StoreError> {
        self.sender
            .send(StoreCommand::Navigate(command))
            .await
            .map_err(|_| StoreError::ChannelClosed)
    }

    pub async fn snapshot(&self) -> Result<StoreSnapshot, StoreError> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(StoreCommand::Snapshot { respond_to: tx })
            .await
            .map_err(|_| StoreError::ChannelClosed)?;

        rx.await.map_err(|_| StoreError::ChannelClosed)
    }

    /// Returns `false` once the actor has stopped.
    pub fn is_connected(&self) -> bool {
        !self.sender.is_closed()
    }
}

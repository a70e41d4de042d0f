//! Client interface for the broadcaster actor.

use tokio::sync::{mpsc, oneshot, watch};

use super::{BroadcastCommand, BroadcastError, SubscriberId};

/// Cheap-to-clone handle to the broadcaster.
///
/// `publish` and `unsubscribe` are fire-and-forget and never block, so they
/// can be called from synchronous code (the store's command handler, or a
/// connection's drop path). A send to a stopped actor is silently ignored.
#[derive(Clone, Debug)]
pub struct BroadcasterHandle {
    sender: mpsc::UnboundedSender<BroadcastCommand>,
}

impl BroadcasterHandle {
    pub fn new(sender: mpsc::UnboundedSender<BroadcastCommand>) -> Self {
        Self { sender }
    }

    /// Publish a new display string to every subscriber.
    pub fn publish(&self, status: impl Into<String>) {
        let _ = self.sender.send(BroadcastCommand::Publish {
            status: status.into(),
        });
    }

    /// Register `sink` under `subscriber_id`.
    ///
    /// The last known status is sent into the sink right away, so the
    /// receiver sees a change even if nothing new is published.
    ///
    /// # Errors
    ///
    /// - `BroadcastError::TooManySubscribers` if the limit is reached
    /// - `BroadcastError::ChannelClosed` if the actor has shut down
    pub async fn subscribe(
        &self,
        subscriber_id: SubscriberId,
        sink: watch::Sender<String>,
    ) -> Result<(), BroadcastError> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(BroadcastCommand::Subscribe {
                subscriber_id,
                sink,
                respond_to: tx,
            })
            .map_err(|_| BroadcastError::ChannelClosed)?;

        rx.await.map_err(|_| BroadcastError::ChannelClosed)?
    }

    pub fn unsubscribe(&self, subscriber_id: SubscriberId) {
        let _ = self
            .sender
            .send(BroadcastCommand::Unsubscribe { subscriber_id });
    }

    /// The last published display string.
    pub async fn current_status(&self) -> Result<String, BroadcastError> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(BroadcastCommand::CurrentStatus { respond_to: tx })
            .map_err(|_| BroadcastError::ChannelClosed)?;

        rx.await.map_err(|_| BroadcastError::ChannelClosed)
    }

    pub async fn subscriber_count(&self) -> Result<usize, BroadcastError> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(BroadcastCommand::SubscriberCount { respond_to: tx })
            .map_err(|_| BroadcastError::ChannelClosed)?;

        rx.await.map_err(|_| BroadcastError::ChannelClosed)
    }
}

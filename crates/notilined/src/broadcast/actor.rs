//! Broadcaster actor - owns the subscriber set and the last status.

use std::collections::HashMap;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use super::{BroadcastCommand, BroadcastError, SubscriberId};

/// The broadcaster actor.
///
/// Runs in a single task; the subscriber map and `last_status` are only
/// touched from here.
pub struct BroadcasterActor {
    receiver: mpsc::UnboundedReceiver<BroadcastCommand>,
    subscribers: HashMap<SubscriberId, watch::Sender<String>>,
    last_status: String,
    max_subscribers: usize,
}

impl BroadcasterActor {
    pub fn new(receiver: mpsc::UnboundedReceiver<BroadcastCommand>, max_subscribers: usize) -> Self {
        Self {
            receiver,
            subscribers: HashMap::new(),
            last_status: String::new(),
            max_subscribers,
        }
    }

    /// Processes commands until every handle is dropped.
    pub async fn run(mut self) {
        info!(max_subscribers = self.max_subscribers, "Broadcaster starting");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!(
            subscribers = self.subscribers.len(),
            "Broadcaster stopped"
        );
    }

    fn handle_command(&mut self, cmd: BroadcastCommand) {
        match cmd {
            BroadcastCommand::Subscribe {
                subscriber_id,
                sink,
                respond_to,
            } => {
                let result = self.handle_subscribe(subscriber_id, sink);
                let _ = respond_to.send(result);
            }
            BroadcastCommand::Unsubscribe { subscriber_id } => {
                if self.subscribers.remove(&subscriber_id).is_some() {
                    debug!(subscriber_id, "Subscriber removed");
                }
            }
            BroadcastCommand::Publish { status } => self.handle_publish(status),
            BroadcastCommand::CurrentStatus { respond_to } => {
                let _ = respond_to.send(self.last_status.clone());
            }
            BroadcastCommand::SubscriberCount { respond_to } => {
                let _ = respond_to.send(self.subscribers.len());
            }
        }
    }

    fn handle_subscribe(
        &mut self,
        subscriber_id: SubscriberId,
        sink: watch::Sender<String>,
    ) -> Result<(), BroadcastError> {
        let replacing = self.subscribers.contains_key(&subscriber_id);
        if !replacing && self.subscribers.len() >= self.max_subscribers {
            warn!(
                subscriber_id,
                max = self.max_subscribers,
                "Subscriber refused: limit reached"
            );
            return Err(BroadcastError::TooManySubscribers {
                max: self.max_subscribers,
            });
        }

        if sink.send(self.last_status.clone()).is_err() {
            debug!(subscriber_id, "Subscriber gone before first delivery");
            self.subscribers.remove(&subscriber_id);
            return Ok(());
        }

        self.subscribers.insert(subscriber_id, sink);
        debug!(
            subscriber_id,
            total = self.subscribers.len(),
            "Subscriber registered"
        );
        Ok(())
    }

    fn handle_publish(&mut self, status: String) {
        debug!(status = %status, subscribers = self.subscribers.len(), "Publishing status");

        // An unread value is overwritten; the subscriber only needs the newest.
        self.subscribers.retain(|&subscriber_id, sink| {
            if sink.send(status.clone()).is_ok() {
                return true;
            }
            debug!(subscriber_id, "Subscriber closed, removing");
            false
        });

        self.last_status = status;
    }

    #[cfg(test)]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

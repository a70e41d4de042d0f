//! Status broadcaster using the Actor pattern.
//!
//! The broadcaster owns the last published display string and the set of
//! subscriber sinks. The store publishes into it; connection handlers
//! subscribe and unsubscribe.
//!
//! ```text
//! ┌────────────┐  Publish   ┌──────────────────┐    send    ┌─────────────┐
//! │ StoreActor │──────────▶│ BroadcasterActor │──────────▶│ subscriber  │
//! └────────────┘            └──────────────────┘           │ sinks (N)   │
//!                                   ▲                      └─────────────┘
//!                 Subscribe /       │
//!                 Unsubscribe ──────┘  (connection handlers)
//! ```
//!
//! Each sink is a `watch` channel holding only the newest status. Delivery
//! never waits on a subscriber: a slow one skips intermediate lines but always
//! ends up with the latest, and a sink whose receiver is gone is dropped from
//! the set.

use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};

mod actor;
mod handle;

pub use actor::BroadcasterActor;
pub use handle::BroadcasterHandle;

/// Identifies one subscriber (in practice, one connection).
pub type SubscriberId = u64;

/// Commands sent to the broadcaster actor.
#[derive(Debug)]
pub enum BroadcastCommand {
    /// Register a sink and immediately deliver the last known status to it.
    ///
    /// Subscribing again with the same id replaces the previous sink.
    Subscribe {
        subscriber_id: SubscriberId,
        sink: watch::Sender<String>,
        respond_to: oneshot::Sender<Result<(), BroadcastError>>,
    },

    /// Remove a sink. No-op if absent.
    Unsubscribe { subscriber_id: SubscriberId },

    /// Record a new status and fan it out.
    Publish { status: String },

    /// Query the last published status.
    CurrentStatus { respond_to: oneshot::Sender<String> },

    /// Query the number of registered sinks.
    SubscriberCount { respond_to: oneshot::Sender<usize> },
}

/// Errors returned by broadcaster operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BroadcastError {
    #[error("too many subscribers (max: {max})")]
    TooManySubscribers { max: usize },

    #[error("broadcaster channel closed")]
    ChannelClosed,
}

/// Spawn the broadcaster actor and return a handle for interaction.
pub fn spawn_broadcaster(max_subscribers: usize) -> BroadcasterHandle {
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

    let actor = BroadcasterActor::new(cmd_rx, max_subscribers);
    tokio::spawn(actor.run());

    BroadcasterHandle::new(cmd_tx)
}

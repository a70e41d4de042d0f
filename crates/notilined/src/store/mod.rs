//! Notification store using the Actor pattern.
//!
//! The store is the single decision point of the daemon: it owns the ordered
//! notifications and the display cursor, runs arbitration, and drives the
//! expiration timer.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐                 ┌────────────┐  Publish  ┌─────────────┐
//! │ D-Bus ingress│──Notify/Close──▶│            │──────────▶│ Broadcaster │
//! └──────────────┘                 │ StoreActor │           └─────────────┘
//! ┌──────────────┐                 │            │
//! │ TCP ingress  │───Navigate─────▶│            │◀── TimerExpired ──┐
//! └──────────────┘                 └────────────┘                   │
//!                                        │  TimerRequest  ┌─────────┴───────┐
//!                                        └───────────────▶│ ExpirationTimer │
//!                                                         └─────────────────┘
//! ```
//!
//! # Panic-Free Guarantees
//!
//! - No `.unwrap()` or `.expect()` in production code
//! - A cursor that points at nothing is a valid state, checked before use
//! - Requests naming unknown ids are no-ops

use tokio::sync::mpsc;

mod actor;
mod commands;
mod handle;

pub use actor::StoreActor;
pub use commands::{NotifyRequest, StoreCommand, StoreError, StoreSnapshot};
pub use handle::StoreHandle;

use crate::broadcast::BroadcasterHandle;
use crate::timer::spawn_timer;

/// Command channel buffer size.
const COMMAND_BUFFER: usize = 100;

/// Spawn the store actor together with its expiration timer.
///
/// `default_timeout_secs` is the countdown used for notifications that ask
/// for the server default. Every display change is published through
/// `broadcaster`.
pub fn spawn_store(default_timeout_secs: u32, broadcaster: BroadcasterHandle) -> StoreHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
    let (timer_tx, expired_rx) = spawn_timer();

    let actor = StoreActor::new(
        cmd_rx,
        timer_tx,
        expired_rx,
        broadcaster,
        default_timeout_secs,
    );
    tokio::spawn(actor.run());

    StoreHandle::new(cmd_tx)
}

//! Expiration timer - a single-slot, restartable countdown.
//!
//! The timer talks to the store over two narrow channels: an unbounded
//! request channel (arm / re-arm / cancel) and a small bounded expiry
//! channel, so an expiry is never dropped while the store is busy.
//!
//! ```text
//!            Arm(secs)               Arm(secs): restart
//!   ┌──────┐ ─────────▶ ┌──────────┐ ◀──────┐
//!   │ Idle │            │ Counting │ ───────┘
//!   └──────┘ ◀───────── └──────────┘
//!      ▲       Cancel         │ deadline reached
//!      │                      ▼
//!      │   send TimerExpired ┌─────────┐
//!      └──────────────────── │ Expired │
//!                            └─────────┘
//! ```
//!
//! Every arm carries a generation number that comes back in the expiry, so
//! the store can tell an expiry for the countdown it armed last from one that
//! was already queued when it cancelled or re-armed.

use tokio::sync::mpsc;
use tokio::time::{sleep_until, Duration, Instant};
use tracing::{debug, info};

/// Capacity of the expiry channel.
const EXPIRY_BUFFER: usize = 4;

/// A request sent from the store to the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerRequest {
    /// Start the countdown, or restart it if one is running.
    Arm { secs: u32, generation: u64 },
    /// Stop the countdown without signaling expiry.
    Cancel,
}

impl TimerRequest {
    /// Builds a request from a raw duration, where zero means cancel.
    pub fn from_secs(secs: u32, generation: u64) -> Self {
        if secs == 0 {
            Self::Cancel
        } else {
            Self::Arm { secs, generation }
        }
    }

    /// The raw duration: seconds for an arm, zero for a cancel.
    pub fn secs(&self) -> u32 {
        match self {
            Self::Arm { secs, .. } => *secs,
            Self::Cancel => 0,
        }
    }
}

/// Signal that the countdown armed with `generation` ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerExpired {
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerState {
    Idle,
    Counting { deadline: Instant, generation: u64 },
    Expired { generation: u64 },
}

/// The countdown task. Owned by its own tokio task; see [`spawn_timer`].
pub struct ExpirationTimer {
    requests: mpsc::UnboundedReceiver<TimerRequest>,
    expired: mpsc::Sender<TimerExpired>,
    state: TimerState,
}

impl ExpirationTimer {
    pub fn new(
        requests: mpsc::UnboundedReceiver<TimerRequest>,
        expired: mpsc::Sender<TimerExpired>,
    ) -> Self {
        Self {
            requests,
            expired,
            state: TimerState::Idle,
        }
    }

    /// Runs the state machine until either channel closes.
    pub async fn run(mut self) {
        info!("Expiration timer starting");

        loop {
            let next = match self.state {
                TimerState::Idle => match self.requests.recv().await {
                    Some(request) => Self::apply(request),
                    None => break,
                },
                TimerState::Counting {
                    deadline,
                    generation,
                } => {
                    tokio::select! {
                        request = self.requests.recv() => match request {
                            Some(request) => Self::apply(request),
                            None => break,
                        },
                        () = sleep_until(deadline) => TimerState::Expired { generation },
                    }
                }
                TimerState::Expired { generation } => {
                    debug!(generation, "Countdown elapsed");
                    if self.expired.send(TimerExpired { generation }).await.is_err() {
                        break;
                    }
                    TimerState::Idle
                }
            };
            self.state = next;
        }

        debug!("Expiration timer stopped");
    }

    fn apply(request: TimerRequest) -> TimerState {
        match request {
            TimerRequest::Arm { secs, generation } if secs > 0 => {
                debug!(secs, generation, "Countdown armed");
                TimerState::Counting {
                    deadline: Instant::now() + Duration::from_secs(u64::from(secs)),
                    generation,
                }
            }
            _ => {
                debug!("Countdown cancelled");
                TimerState::Idle
            }
        }
    }
}

/// Spawns the timer task, returning its request sender and expiry receiver.
pub fn spawn_timer() -> (
    mpsc::UnboundedSender<TimerRequest>,
    mpsc::Receiver<TimerExpired>,
) {
    let (request_tx, request_rx) = mpsc::unbounded_channel();
    let (expired_tx, expired_rx) = mpsc::channel(EXPIRY_BUFFER);

    tokio::spawn(ExpirationTimer::new(request_rx, expired_tx).run());

    (request_tx, expired_rx)
}

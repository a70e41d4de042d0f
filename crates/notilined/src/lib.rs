//! notiline daemon - notification store and status broadcast server
//!
//! This crate provides the moving parts of the daemon:
//! - `store` - Notification store actor; the single owner of notification state
//! - `timer` - Expiration countdown driven by the store
//! - `broadcast` - Fan-out of the current display string to subscribers
//! - `server` - Line-based TCP listener for subscribers and remote commands
//! - `dbus` - `org.freedesktop.Notifications` ingress on the session bus
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   NotifyRequest    ┌───────────────────┐  TimerRequest  ┌─────────────────┐
//! │  dbus ingress│──────────────────▶│                   │───────────────▶│ ExpirationTimer │
//! └──────────────┘   (oneshot id)     │    StoreActor     │◀───────────────│                 │
//! ┌──────────────┐   NavCommand       │ (notification     │  TimerExpired  └─────────────────┘
//! │ DaemonServer │──────────────────▶│  list + cursor)   │
//! │ (TCP lines)  │                    └─────────┬─────────┘
//! └──────┬───────┘                              │ publish(status)
//!        │ subscribe / unsubscribe              ▼
//!        │                          ┌───────────────────────┐
//!        └─────────────────────────▶│   BroadcasterActor    │───▶ subscriber sinks
//!                                   └───────────────────────┘
//! ```
//!
//! # Panic-Free Guarantees
//!
//! All production code in this crate follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations return `Result` or `Option`
//! - Channel operations handle closure gracefully

pub mod broadcast;
pub mod dbus;
pub mod server;
pub mod store;
pub mod timer;

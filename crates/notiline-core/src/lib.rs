//! notiline core - shared domain types for the notification daemon
//!
//! This crate holds the runtime-free part of the daemon: notifications and
//! their revision history, the ordered arena the store keeps them in, and the
//! remote navigation vocabulary.
//!
//! All code follows the panic-free policy: no `.unwrap()`, `.expect()`,
//! `panic!()`, `unreachable!()`, `todo!()`, or direct indexing `[i]`.

pub mod command;
pub mod error;
pub mod list;
pub mod notification;

// Re-exports for convenience
pub use command::NavCommand;
pub use error::DomainError;
pub use list::{NotifKey, NotificationList};
pub use notification::{
    ExpirePolicy, Notification, NotificationId, NotificationRevision, NotificationView,
    DEFAULT_TIMEOUT_SECS,
};

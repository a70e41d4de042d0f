//! Domain-specific error types following panic-free policy.

use thiserror::Error;

/// Errors that can occur in domain operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Notification ids are positive; zero means "no id" on the wire.
    #[error("notification id must be non-zero")]
    ZeroId,

    /// A token that is not part of the remote navigation vocabulary.
    #[error("unknown command: {0:?}")]
    UnknownCommand(String),
}

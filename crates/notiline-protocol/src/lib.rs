//! notiline protocol - the subscriber socket's line protocol
//!
//! Clients send newline-terminated lines: the literal `sub` subscribes to
//! display updates, anything else non-empty is a navigation command. The
//! daemon answers subscribers with one display string per line, where an
//! empty line means "nothing to show".
//!
//! The shared [`Config`] lives here too, so a client can find the daemon
//! without linking the daemon itself.

pub mod config;
pub mod message;
pub mod parse;

pub use config::{Config, ConfigError};
pub use message::{ClientLine, StatusFrame, SUBSCRIBE_TOKEN};
pub use parse::{parse_line, ProtocolError, MAX_LINE_LEN};

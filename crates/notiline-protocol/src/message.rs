//! Protocol message types.

use notiline_core::NavCommand;

/// Line a client sends to start receiving display updates.
pub const SUBSCRIBE_TOKEN: &str = "sub";

/// A decoded client line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientLine {
    /// Start streaming display strings to this connection.
    Subscribe,
    /// A navigation command for the store.
    Command(NavCommand),
    /// Empty line or unknown token; carries the trimmed text for logging.
    Ignored(String),
}

impl ClientLine {
    /// Encodes this line for sending, including the trailing newline.
    pub fn encode(&self) -> String {
        match self {
            Self::Subscribe => format!("{SUBSCRIBE_TOKEN}\n"),
            Self::Command(cmd) => format!("{cmd}\n"),
            Self::Ignored(text) => format!("{text}\n"),
        }
    }
}

/// One display string, framed for the wire.
///
/// Line breaks inside the text would split one update into several, so
/// they are flattened to spaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusFrame(String);

impl StatusFrame {
    pub fn new(status: &str) -> Self {
        Self(status.replace(['\r', '\n'], " "))
    }

    /// The sanitized display text, without the terminator.
    pub fn text(&self) -> &str {
        &self.0
    }

    /// Bytes to write: the text plus a `\n` terminator.
    pub fn to_line(&self) -> String {
        format!("{}\n", self.0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

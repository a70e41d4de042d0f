//! Parsing of inbound client lines.

use notiline_core::NavCommand;
use thiserror::Error;

use crate::message::{ClientLine, SUBSCRIBE_TOKEN};

/// Longest line a client may send, terminator included.
pub const MAX_LINE_LEN: usize = 4096;

/// Errors raised while decoding client input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("line too long: {len} bytes (max: {max})")]
    LineTooLong { len: usize, max: usize },
}

/// Decodes one raw line (with or without its terminator).
///
/// Surrounding whitespace is ignored. Unknown tokens are not an error: they
/// decode to [`ClientLine::Ignored`] so the connection stays usable.
pub fn parse_line(raw: &str) -> Result<ClientLine, ProtocolError> {
    if raw.len() > MAX_LINE_LEN {
        return Err(ProtocolError::LineTooLong {
            len: raw.len(),
            max: MAX_LINE_LEN,
        });
    }

    let line = raw.trim();
    if line == SUBSCRIBE_TOKEN {
        return Ok(ClientLine::Subscribe);
    }

    Ok(line
        .parse::<NavCommand>()
        .map_or_else(|_| ClientLine::Ignored(line.to_string()), ClientLine::Command))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subscribe() {
        assert_eq!(parse_line("sub\n"), Ok(ClientLine::Subscribe));
        assert_eq!(parse_line("  sub \r\n"), Ok(ClientLine::Subscribe));
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            parse_line("nextmsg\n"),
            Ok(ClientLine::Command(NavCommand::NextMsg))
        );
        assert_eq!(parse_line("hide"), Ok(ClientLine::Command(NavCommand::Hide)));
    }

    #[test]
    fn test_unknown_and_empty_are_ignored() {
        assert_eq!(parse_line("\n"), Ok(ClientLine::Ignored(String::new())));
        assert_eq!(
            parse_line("reboot\n"),
            Ok(ClientLine::Ignored("reboot".to_string()))
        );
    }

    #[test]
    fn test_line_too_long() {
        let raw = "x".repeat(MAX_LINE_LEN + 1);
        assert_eq!(
            parse_line(&raw),
            Err(ProtocolError::LineTooLong {
                len: MAX_LINE_LEN + 1,
                max: MAX_LINE_LEN
            })
        );
    }
}

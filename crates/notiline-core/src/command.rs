//! Remote navigation commands.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A user navigation command, as received from the subscriber socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavCommand {
    /// Step to the next (newer) revision, crossing into the next notification.
    NextMsg,
    /// Step to the previous (older) revision, crossing into the previous notification.
    PrevMsg,
    /// Jump to the next notification's latest revision.
    NextNotif,
    /// Jump to the previous notification's latest revision.
    PrevNotif,
    /// Remove the notification under the cursor.
    Dismiss,
    /// Remove every notification.
    DismissAll,
    /// Mark the notification under the cursor as seen and move on.
    Hide,
    /// Mark everything seen and blank the display.
    HideAll,
}

impl NavCommand {
    pub const ALL: [NavCommand; 8] = [
        Self::NextMsg,
        Self::PrevMsg,
        Self::NextNotif,
        Self::PrevNotif,
        Self::Dismiss,
        Self::DismissAll,
        Self::Hide,
        Self::HideAll,
    ];

    /// The wire token for this command.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NextMsg => "nextmsg",
            Self::PrevMsg => "prevmsg",
            Self::NextNotif => "nextnotif",
            Self::PrevNotif => "prevnotif",
            Self::Dismiss => "dismiss",
            Self::DismissAll => "dismissall",
            Self::Hide => "hide",
            Self::HideAll => "hideall",
        }
    }
}

impl FromStr for NavCommand {
    type Err = DomainError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|cmd| cmd.as_str() == token)
            .ok_or_else(|| DomainError::UnknownCommand(token.to_string()))
    }
}

impl fmt::Display for NavCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vocabulary() {
        assert_eq!("nextmsg".parse::<NavCommand>(), Ok(NavCommand::NextMsg));
        assert_eq!("prevnotif".parse::<NavCommand>(), Ok(NavCommand::PrevNotif));
        assert_eq!("dismissall".parse::<NavCommand>(), Ok(NavCommand::DismissAll));
        assert_eq!("hideall".parse::<NavCommand>(), Ok(NavCommand::HideAll));

        for cmd in NavCommand::ALL {
            assert_eq!(cmd.as_str().parse::<NavCommand>(), Ok(cmd));
        }
    }

    #[test]
    fn test_unknown_tokens_rejected() {
        assert!(matches!(
            "NEXTMSG".parse::<NavCommand>(),
            Err(DomainError::UnknownCommand(_))
        ));
        assert!("".parse::<NavCommand>().is_err());
        assert!("sub".parse::<NavCommand>().is_err());
    }
}

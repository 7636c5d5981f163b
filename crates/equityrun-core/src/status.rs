//! Street and channel status enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A betting round, in board order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Street {
    Flop,
    Turn,
    River,
}

impl Street {
    /// Display label used by the remote service.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Flop => "Flop",
            Self::Turn => "Turn",
            Self::River => "River",
        }
    }

    /// Name of the submission field carrying the call amount on this street.
    pub fn call_field(&self) -> &'static str {
        match self {
            Self::Flop => "call_flop",
            Self::Turn => "call_turn",
            Self::River => "call_river",
        }
    }
}

impl fmt::Display for Street {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Transport state of a progress channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelStatus {
    /// No channel opened yet.
    #[default]
    Idle,
    /// First connection attempt in flight.
    Connecting,
    /// Connected and receiving messages.
    Open,
    /// Connection dropped, the transport is retrying.
    Reconnecting {
        /// Consecutive attempts since the last successful open.
        attempt: u32,
    },
    /// The channel ended with an unrecoverable error.
    Failed,
    /// The channel was closed normally or superseded.
    Closed,
}

impl ChannelStatus {
    /// Returns true if no further messages will arrive on this channel.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed | Self::Closed)
    }

    /// Returns true while the transport is recovering from a drop.
    pub fn is_reconnecting(&self) -> bool {
        matches!(self, Self::Reconnecting { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_fields() {
        assert_eq!(Street::Flop.call_field(), "call_flop");
        assert_eq!(Street::Turn.call_field(), "call_turn");
        assert_eq!(Street::River.call_field(), "call_river");
    }

    #[test]
    fn test_street_ordering() {
        assert!(Street::Flop < Street::Turn);
        assert!(Street::Turn < Street::River);
    }

    #[test]
    fn test_channel_status_terminal() {
        assert!(ChannelStatus::Closed.is_terminal());
        assert!(ChannelStatus::Failed.is_terminal());
        assert!(!ChannelStatus::Reconnecting { attempt: 3 }.is_terminal());
        assert!(ChannelStatus::Reconnecting { attempt: 1 }.is_reconnecting());
    }
}

//! Channel status type definitions
//!
//! Supporting types for channel status notifications.

use serde::{Deserialize, Serialize};

use crate::config::ChannelDescriptor;

/// Derived break-away status of one channel
///
/// Never stored: recomputed from configuration and the playout service's
/// break-away state on every query.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChannelStatus {
    /// Channel is governed by a break-away group
    pub has_break_away: bool,
    /// Playout service reports break-away active on the channel
    pub in_break_away: bool,
    pub default_path: String,
    pub sequence_path: String,
}

/// Why a channel status notification was raised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum StatusChange {
    /// First configuration load
    Present,
    /// Channel joined the configuration
    Added,
    /// Channel left the configuration
    Removed,
    /// Channel's derived status differs under the new configuration
    Updated,
    /// Break-away content was spliced in
    BreakAwayStarted,
    /// Channel resumed its original sequence
    BreakAwayEnded,
}

impl std::fmt::Display for StatusChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusChange::Present => write!(f, "Present"),
            StatusChange::Added => write!(f, "Added"),
            StatusChange::Removed => write!(f, "Removed"),
            StatusChange::Updated => write!(f, "Updated"),
            StatusChange::BreakAwayStarted => write!(f, "BreakAwayStarted"),
            StatusChange::BreakAwayEnded => write!(f, "BreakAwayEnded"),
        }
    }
}

/// Per-channel status notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelStatusChanged {
    pub channel: ChannelDescriptor,
    pub status: ChannelStatus,
    pub change: StatusChange,
}

impl ChannelStatusChanged {
    pub fn new(channel: ChannelDescriptor, status: ChannelStatus, change: StatusChange) -> Self {
        Self {
            channel,
            status,
            change,
        }
    }
}

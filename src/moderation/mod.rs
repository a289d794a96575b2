//! Moderation actions and their fan-out across managed chats.

pub mod coordinator;
pub mod duration;

pub use coordinator::{count_failures, ModerationCoordinator};
pub use duration::{DurationError, MuteDuration, MuteUnit, MAX_MUTE_MINUTES};

use crate::gateway::GatewayError;

/// A moderation decision to carry out against a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationAction {
    /// Remove the user from the chat, optionally wiping their messages.
    Ban { revoke_history: bool },
    /// Allow a previously banned user to rejoin.
    Unban,
    /// Restrict the user to read-only until the duration elapses.
    Mute(MuteDuration),
    /// Restore full message permissions.
    Unmute,
}

impl ModerationAction {
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::Ban { .. } => ActionKind::Ban,
            Self::Unban => ActionKind::Unban,
            Self::Mute(_) => ActionKind::Mute,
            Self::Unmute => ActionKind::Unmute,
        }
    }
}

/// Action label carried by outcomes and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Ban,
    Unban,
    Mute,
    Unmute,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Ban => "ban",
            Self::Unban => "unban",
            Self::Mute => "mute",
            Self::Unmute => "unmute",
        };
        f.write_str(label)
    }
}

/// Terminal result of one action against one chat.
///
/// A fan-out produces one of these per chat; the aggregate is always the
/// full list, never a single boolean.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModerationOutcome {
    pub chat_id: i64,
    pub action: ActionKind,
    pub result: Result<(), GatewayError>,
}

impl ModerationOutcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

//! Domain events fed into the dispatch chain.
//!
//! Events are immutable snapshots of one inbound platform update and live
//! for exactly one dispatch pass.

/// Kind of chat an event originated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
}

/// Chat an event originated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatRef {
    pub id: i64,
    pub kind: ChatKind,
}

impl ChatRef {
    /// Group and supergroup chats are the ones the service moderates.
    #[must_use]
    pub const fn is_multi_user(&self) -> bool {
        matches!(self.kind, ChatKind::Group | ChatKind::Supergroup)
    }
}

/// Author identity attached to an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: String,
}

/// Replied-to message referenced by a moderation command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyRef {
    pub message_id: i32,
    pub author: Author,
    pub text: Option<String>,
}

/// An inbound chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEvent {
    pub chat: ChatRef,
    pub author: Author,
    pub message_id: i32,
    pub text: Option<String>,
    pub reply_to: Option<ReplyRef>,
}

/// Direction of a membership change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipUpdate {
    Joined,
    Left,
}

/// A user joining or leaving a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipEvent {
    pub chat: ChatRef,
    pub user: Author,
    pub update: MembershipUpdate,
}

/// An inline-keyboard button press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackEvent {
    /// Chat of the message carrying the keyboard, when still accessible.
    pub chat: Option<ChatRef>,
    pub author: Author,
    pub data: Option<String>,
    pub message_id: Option<i32>,
}

/// Tagged union of everything the pipeline can receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Message(MessageEvent),
    MembershipChange(MembershipEvent),
    CallbackQuery(CallbackEvent),
}

impl Event {
    /// The acting user behind the event.
    #[must_use]
    pub const fn author(&self) -> &Author {
        match self {
            Self::Message(message) => &message.author,
            Self::MembershipChange(membership) => &membership.user,
            Self::CallbackQuery(callback) => &callback.author,
        }
    }

    /// Originating chat, when the platform told us.
    #[must_use]
    pub const fn chat(&self) -> Option<&ChatRef> {
        match self {
            Self::Message(message) => Some(&message.chat),
            Self::MembershipChange(membership) => Some(&membership.chat),
            Self::CallbackQuery(callback) => callback.chat.as_ref(),
        }
    }
}

use grokchat_llm::{Turn, TurnRole};
use serde::{Deserialize, Serialize};

/// Bot text substituted when a reply cannot be fetched or parsed.
pub const FALLBACK_REPLY_TEXT: &str = "Ошибка при соединении с сервером.";

/// Author of one conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    /// Role used for this sender on the assistant wire format.
    pub const fn turn_role(self) -> TurnRole {
        match self {
            Self::User => TurnRole::User,
            Self::Bot => TurnRole::Assistant,
        }
    }
}

/// One persisted conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sender: Sender,
    pub text: String,
}

impl Message {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text)
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self::new(Sender::Bot, text)
    }

    /// Bot turn shown in place of a reply that failed to arrive.
    pub fn fallback_reply() -> Self {
        Self::bot(FALLBACK_REPLY_TEXT)
    }

    pub fn to_turn(&self) -> Turn {
        Turn::new(self.sender.turn_role(), self.text.clone())
    }
}

/// Reply lifecycle of a chat session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AwaitState {
    #[default]
    Idle,
    Awaiting,
}

/// Transition input for the reply lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AwaitTransition {
    Begin,
    Resolve,
}

/// Rejection reason for illegal reply lifecycle transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AwaitTransitionRejection {
    AlreadyAwaiting,
    NotAwaiting,
}

pub type AwaitTransitionResult = Result<AwaitState, AwaitTransitionRejection>;

impl AwaitState {
    pub fn is_awaiting(self) -> bool {
        matches!(self, Self::Awaiting)
    }

    /// Applies one transition.
    ///
    /// Only one reply may be outstanding: `Begin` is legal from `Idle` and
    /// `Resolve` from `Awaiting`, every other pairing is rejected.
    pub fn apply(self, transition: AwaitTransition) -> AwaitTransitionResult {
        match (self, transition) {
            (Self::Idle, AwaitTransition::Begin) => Ok(Self::Awaiting),
            (Self::Awaiting, AwaitTransition::Begin) => {
                Err(AwaitTransitionRejection::AlreadyAwaiting)
            }
            (Self::Awaiting, AwaitTransition::Resolve) => Ok(Self::Idle),
            (Self::Idle, AwaitTransition::Resolve) => Err(AwaitTransitionRejection::NotAwaiting),
        }
    }
}

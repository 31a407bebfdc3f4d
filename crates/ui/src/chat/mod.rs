/// Event contracts for chat module wiring.
pub mod events;
/// Persistence of the conversation under a fixed store key.
pub mod history;
/// Domain entities and the reply lifecycle.
pub mod message;
pub mod message_input;
pub mod message_list;
pub mod scroll_manager;
pub mod session;
pub mod view;

pub use events::{DraftEdited, Submit};
pub use history::{ChatHistory, HISTORY_KEY, HistoryError, HistoryResult};
pub use message::{
    AwaitState, AwaitTransition, AwaitTransitionRejection, AwaitTransitionResult,
    FALLBACK_REPLY_TEXT, Message, Sender,
};
pub use message_input::MessageInput;
pub use message_list::{ConversationRow, MessageList, conversation_rows};
pub use scroll_manager::ScrollManager;
pub use session::ChatSession;
pub use view::ChatView;

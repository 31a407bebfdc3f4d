use std::sync::Arc;

use grokchat_storage::{KeyValueStore, StorageError};
use snafu::{ResultExt, Snafu};

use crate::chat::message::Message;

/// Storage key holding the serialized conversation.
pub const HISTORY_KEY: &str = "grok_chat_history";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum HistoryError {
    #[snafu(display("history store failed on `{stage}`: {source}"))]
    Store {
        stage: &'static str,
        source: StorageError,
    },
    #[snafu(display("failed to encode chat history on `{stage}`: {source}"))]
    Encode {
        stage: &'static str,
        source: serde_json::Error,
    },
    #[snafu(display("stored chat history is malformed on `{stage}`: {source}"))]
    Decode {
        stage: &'static str,
        source: serde_json::Error,
    },
}

pub type HistoryResult<T> = Result<T, HistoryError>;

/// Reads and writes the whole message list under one fixed key.
#[derive(Clone)]
pub struct ChatHistory {
    store: Arc<dyn KeyValueStore>,
}

impl ChatHistory {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Loads the stored list. An absent entry is an empty history.
    pub fn load(&self) -> HistoryResult<Vec<Message>> {
        let Some(raw) = self.store.get(HISTORY_KEY).context(StoreSnafu {
            stage: "history-load-read",
        })?
        else {
            return Ok(Vec::new());
        };

        serde_json::from_str(&raw).context(DecodeSnafu {
            stage: "history-load-decode",
        })
    }

    /// Loads the stored list, treating unreadable or corrupt entries as empty.
    ///
    /// The corrupt entry is left in place until the next save overwrites it.
    pub fn load_or_default(&self) -> Vec<Message> {
        match self.load() {
            Ok(messages) => {
                tracing::debug!(count = messages.len(), "restored chat history");
                messages
            }
            Err(error @ HistoryError::Decode { .. }) => {
                tracing::warn!("discarding malformed chat history: {error}");
                Vec::new()
            }
            Err(error) => {
                tracing::error!("failed to read chat history: {error}");
                Vec::new()
            }
        }
    }

    /// Serializes the full list and overwrites the stored entry.
    pub fn save(&self, messages: &[Message]) -> HistoryResult<()> {
        let raw = serde_json::to_string(messages).context(EncodeSnafu {
            stage: "history-save-encode",
        })?;

        self.store.set(HISTORY_KEY, &raw).context(StoreSnafu {
            stage: "history-save-write",
        })
    }
}

impl std::fmt::Debug for ChatHistory {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ChatHistory")
            .field("key", &HISTORY_KEY)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use grokchat_storage::MemoryStore;

    use super::*;

    #[test]
    fn missing_entry_loads_as_empty() {
        let history = ChatHistory::new(Arc::new(MemoryStore::new()));
        assert_eq!(history.load().unwrap(), Vec::new());
    }

    #[test]
    fn save_then_load_restores_identical_list() {
        let store = Arc::new(MemoryStore::new());
        let history = ChatHistory::new(store.clone());
        let messages = vec![
            Message::user("hello"),
            Message::bot("hi there"),
            Message::user("  spaced  \n multi-line "),
            Message::bot(""),
        ];

        history.save(&messages).unwrap();

        assert_eq!(history.load().unwrap(), messages);
        let raw = store.get(HISTORY_KEY).unwrap().unwrap();
        assert!(raw.starts_with(r#"[{"sender":"user","text":"hello"}"#));
    }

    #[test]
    fn malformed_entry_is_a_decode_error_and_loads_as_empty() {
        let history = ChatHistory::new(Arc::new(MemoryStore::with_entry(
            HISTORY_KEY,
            r#"[{"sender":"robot","text":1}"#,
        )));

        assert!(matches!(history.load(), Err(HistoryError::Decode { .. })));
        assert!(history.load_or_default().is_empty());
    }
}

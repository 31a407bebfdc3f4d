use grokchat_llm::{ProviderResult, ReplyClient, ReplyRequest};

use crate::chat::history::ChatHistory;
use crate::chat::message::{
    AwaitState, AwaitTransition, AwaitTransitionResult, Message,
};

/// Conversation state behind the chat view: draft, message list and reply lifecycle.
///
/// The list is append-only and every append is mirrored to the history store.
#[derive(Debug)]
pub struct ChatSession {
    history: ChatHistory,
    messages: Vec<Message>,
    draft: String,
    await_state: AwaitState,
}

impl ChatSession {
    /// Creates a session seeded from the stored history.
    pub fn restore(history: ChatHistory) -> Self {
        let messages = history.load_or_default();
        Self {
            history,
            messages,
            draft: String::new(),
            await_state: AwaitState::Idle,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn await_state(&self) -> AwaitState {
        self.await_state
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.await_state.is_awaiting()
    }

    /// True when `submit` would start a request.
    pub fn can_submit(&self) -> bool {
        !self.is_awaiting_reply() && !self.draft.trim().is_empty()
    }

    /// Mirrors the composer text on every edit. The composer is locked while a reply is awaited.
    pub fn edit_draft(&mut self, text: impl Into<String>) {
        if self.is_awaiting_reply() {
            return;
        }
        self.draft = text.into();
    }

    /// Appends the draft as a user turn and returns the request carrying the full history.
    ///
    /// Returns `None` without touching any state when the draft is blank or a
    /// reply is already outstanding.
    pub fn submit(&mut self) -> Option<ReplyRequest> {
        if !self.can_submit() {
            return None;
        }

        let next_state = self.await_state.apply(AwaitTransition::Begin).ok()?;
        self.push(Message::user(self.draft.clone()));
        self.await_state = next_state;

        Some(ReplyRequest::new(
            self.messages.iter().map(Message::to_turn).collect(),
        ))
    }

    /// Completes the outstanding reply with either the fetched text or the fallback turn.
    pub fn resolve(&mut self, outcome: ProviderResult<String>) -> AwaitTransitionResult {
        let next_state = self.await_state.apply(AwaitTransition::Resolve)?;

        let reply = match outcome {
            Ok(text) => Message::bot(text),
            Err(error) => {
                tracing::warn!("reply fetch failed, substituting fallback: {error}");
                Message::fallback_reply()
            }
        };

        self.push(reply);
        self.await_state = next_state;
        self.draft.clear();
        Ok(next_state)
    }

    /// Runs one full submit/fetch/resolve cycle against `client`.
    ///
    /// Returns `false` when the draft was not submittable.
    pub async fn submit_with(&mut self, client: &dyn ReplyClient) -> bool {
        let Some(request) = self.submit() else {
            return false;
        };

        let outcome = client.fetch_reply(request).await;
        self.resolve(outcome).is_ok()
    }

    fn push(&mut self, message: Message) {
        self.messages.push(message);
        if let Err(error) = self.history.save(&self.messages) {
            tracing::error!("failed to persist chat history: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use grokchat_llm::{BoxFuture, ProviderError, Turn};
    use grokchat_storage::{KeyValueStore, MemoryStore};

    use super::*;
    use crate::chat::history::HISTORY_KEY;
    use crate::chat::message::{AwaitTransitionRejection, FALLBACK_REPLY_TEXT};

    struct StubClient {
        reply: Option<&'static str>,
        requests: Mutex<Vec<ReplyRequest>>,
    }

    impl StubClient {
        fn replying(reply: &'static str) -> Self {
            Self {
                reply: Some(reply),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: None,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<ReplyRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl ReplyClient for StubClient {
        fn fetch_reply<'a>(
            &'a self,
            request: ReplyRequest,
        ) -> BoxFuture<'a, ProviderResult<String>> {
            self.requests.lock().unwrap().push(request);
            let outcome = match self.reply {
                Some(reply) => Ok(reply.to_string()),
                None => Err(ProviderError::ReplyStatus {
                    stage: "stub-reply",
                    status: 502,
                    body: "bad gateway".to_string(),
                }),
            };
            Box::pin(async move { outcome })
        }
    }

    fn session_with_store() -> (ChatSession, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let session = ChatSession::restore(ChatHistory::new(store.clone()));
        (session, store)
    }

    fn stored(store: &MemoryStore) -> Vec<Message> {
        let raw = store.get(HISTORY_KEY).unwrap().unwrap_or_else(|| "[]".to_string());
        serde_json::from_str(&raw).unwrap()
    }

    #[test]
    fn submit_appends_user_turn_before_any_reply() {
        let (mut session, store) = session_with_store();
        session.edit_draft("hello");

        let request = session.submit().expect("request");

        assert_eq!(session.messages(), &[Message::user("hello")]);
        assert!(session.is_awaiting_reply());
        assert_eq!(request.messages, vec![Turn::user("hello")]);
        assert_eq!(stored(&store), vec![Message::user("hello")]);
    }

    #[test]
    fn blank_drafts_are_ignored() {
        let (mut session, store) = session_with_store();

        for draft in ["", "   ", "\n\t "] {
            session.edit_draft(draft);
            assert!(session.submit().is_none());
        }

        assert!(session.messages().is_empty());
        assert_eq!(session.await_state(), AwaitState::Idle);
        assert_eq!(store.get(HISTORY_KEY).unwrap(), None);
    }

    #[test]
    fn draft_follows_each_edit_until_submit() {
        let (mut session, _store) = session_with_store();

        for draft in ["h", "he", "hel", "hello"] {
            session.edit_draft(draft);
            assert_eq!(session.draft(), draft);
            assert!(session.can_submit());
        }

        session.edit_draft("");
        assert_eq!(session.draft(), "");
        assert!(!session.can_submit());

        session.edit_draft("hello");
        let request = session.submit().expect("request");
        assert_eq!(request.messages, vec![Turn::user("hello")]);
    }

    #[test]
    fn draft_is_sent_verbatim() {
        let (mut session, _store) = session_with_store();
        session.edit_draft("  padded question ");

        let request = session.submit().expect("request");

        assert_eq!(session.messages()[0].text, "  padded question ");
        assert_eq!(request.messages[0].content, "  padded question ");
    }

    #[test]
    fn second_submit_is_blocked_while_awaiting() {
        let (mut session, _store) = session_with_store();
        session.edit_draft("first");
        session.submit().expect("first request");

        session.edit_draft("second");
        assert!(session.submit().is_none());
        assert_eq!(session.messages(), &[Message::user("first")]);
        assert_eq!(session.draft(), "first");
    }

    #[test]
    fn awaiting_holds_only_between_submit_and_resolve() {
        let (mut session, _store) = session_with_store();
        assert!(!session.is_awaiting_reply());

        session.edit_draft("hello");
        session.submit().expect("request");
        assert!(session.is_awaiting_reply());

        session.resolve(Ok("hi there".to_string())).unwrap();
        assert!(!session.is_awaiting_reply());
    }

    #[test]
    fn resolve_without_outstanding_reply_is_rejected() {
        let (mut session, store) = session_with_store();

        assert_eq!(
            session.resolve(Ok("stray".to_string())),
            Err(AwaitTransitionRejection::NotAwaiting)
        );
        assert!(session.messages().is_empty());
        assert_eq!(store.get(HISTORY_KEY).unwrap(), None);
    }

    #[test]
    fn request_carries_full_history_with_roles() {
        let store = Arc::new(MemoryStore::new());
        ChatHistory::new(store.clone())
            .save(&[Message::user("hello"), Message::bot("hi there")])
            .unwrap();
        let mut session = ChatSession::restore(ChatHistory::new(store));

        session.edit_draft("how are you?");
        let request = session.submit().expect("request");

        assert_eq!(
            request.messages,
            vec![
                Turn::user("hello"),
                Turn::assistant("hi there"),
                Turn::user("how are you?"),
            ]
        );
    }

    #[tokio::test]
    async fn successful_reply_is_appended_as_bot_turn() {
        let (mut session, store) = session_with_store();
        let client = StubClient::replying("hi there");
        session.edit_draft("hello");

        assert!(session.submit_with(&client).await);

        let expected = vec![Message::user("hello"), Message::bot("hi there")];
        assert_eq!(session.messages(), expected.as_slice());
        assert_eq!(stored(&store), expected);
        assert!(!session.is_awaiting_reply());
        assert_eq!(session.draft(), "");
        assert_eq!(client.requests().len(), 1);
    }

    #[tokio::test]
    async fn failed_reply_is_replaced_by_fallback_turn() {
        let (mut session, store) = session_with_store();
        let client = StubClient::failing();
        session.edit_draft("hello");

        assert!(session.submit_with(&client).await);

        let expected = vec![
            Message::user("hello"),
            Message::bot("Ошибка при соединении с сервером."),
        ];
        assert_eq!(session.messages(), expected.as_slice());
        assert_eq!(session.messages()[1].text, FALLBACK_REPLY_TEXT);
        assert_eq!(stored(&store), expected);
        assert!(!session.is_awaiting_reply());
        assert_eq!(session.draft(), "");
    }

    #[tokio::test]
    async fn blank_draft_never_reaches_the_client() {
        let (mut session, _store) = session_with_store();
        let client = StubClient::replying("unused");
        session.edit_draft("   ");

        assert!(!session.submit_with(&client).await);
        assert!(client.requests().is_empty());
    }

    #[tokio::test]
    async fn restored_session_continues_existing_history() {
        let store = Arc::new(MemoryStore::new());
        {
            let mut session = ChatSession::restore(ChatHistory::new(store.clone()));
            session.edit_draft("hello");
            session
                .submit_with(&StubClient::replying("hi there"))
                .await;
        }

        let mut reopened = ChatSession::restore(ChatHistory::new(store.clone()));
        assert_eq!(
            reopened.messages(),
            &[Message::user("hello"), Message::bot("hi there")]
        );

        reopened.edit_draft("again");
        reopened.submit_with(&StubClient::failing()).await;
        assert_eq!(stored(&store).len(), 4);
    }

    #[test]
    fn malformed_history_restores_as_empty_session() {
        let store = Arc::new(MemoryStore::with_entry(HISTORY_KEY, "{not json"));
        let session = ChatSession::restore(ChatHistory::new(store.clone()));

        assert!(session.messages().is_empty());
        assert_eq!(store.get(HISTORY_KEY).unwrap().as_deref(), Some("{not json"));
    }
}

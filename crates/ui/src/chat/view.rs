use std::sync::Arc;

use gpui::*;
use gpui_component::{ActiveTheme, v_flex};
use gpui_tokio_bridge::Tokio;
use grokchat_llm::{ProviderError, ProviderResult, ReplyClient, ReplyRequest};

use crate::chat::events::{DraftEdited, Submit};
use crate::chat::session::ChatSession;
use crate::chat::{MessageInput, MessageList};

/// Coordinator for the transcript, the composer and the single in-flight reply.
pub struct ChatView {
    session: ChatSession,
    client: Arc<dyn ReplyClient>,
    message_list: Entity<MessageList>,
    message_input: Entity<MessageInput>,
    reply_task: Option<Task<()>>,
}

impl ChatView {
    pub fn new(
        session: ChatSession,
        client: Arc<dyn ReplyClient>,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) -> Self {
        let message_list = cx.new(MessageList::new);
        let message_input = cx.new(|cx| MessageInput::new(window, cx));

        cx.subscribe(&message_input, |this, _, event: &DraftEdited, _cx| {
            this.session.edit_draft(event.content.clone());
        })
        .detach();
        cx.subscribe(&message_input, |this, _, event: &Submit, cx| {
            this.handle_submit(event.clone(), cx);
        })
        .detach();

        let this = Self {
            session,
            client,
            message_list,
            message_input,
            reply_task: None,
        };
        this.sync_message_list(cx);
        this
    }

    fn handle_submit(&mut self, event: Submit, cx: &mut Context<Self>) {
        if self.session.is_awaiting_reply() {
            // Composer is locked while a reply is outstanding.
            return;
        }

        // The composer value at submit time wins over any edit still in flight.
        self.session.edit_draft(event.content);
        let Some(request) = self.session.submit() else {
            return;
        };

        self.message_input.update(cx, |input, cx| {
            input.set_awaiting(true, cx);
        });
        self.sync_message_list(cx);
        self.spawn_reply(request, cx);
        cx.notify();
    }

    fn spawn_reply(&mut self, request: ReplyRequest, cx: &mut Context<Self>) {
        let client = self.client.clone();
        let worker = Tokio::spawn(cx, async move { client.fetch_reply(request).await });

        // Dropping the view drops this task, which abandons the in-flight request.
        self.reply_task = Some(cx.spawn(async move |this, cx| {
            let outcome = settle_reply(worker.await);

            let _ = this.update(cx, |this, cx| {
                this.finish_reply(outcome, cx);
            });
        }));
    }

    fn finish_reply(&mut self, outcome: ProviderResult<String>, cx: &mut Context<Self>) {
        self.reply_task = None;

        if let Err(rejection) = self.session.resolve(outcome) {
            tracing::debug!("ignoring reply without an outstanding request: {rejection:?}");
            return;
        }

        self.message_input.update(cx, |input, cx| {
            input.set_awaiting(false, cx);
            input.request_clear(cx);
        });
        self.sync_message_list(cx);
        cx.notify();
    }

    fn sync_message_list(&self, cx: &mut Context<Self>) {
        let messages = self.session.messages().to_vec();
        let awaiting = self.session.is_awaiting_reply();

        self.message_list.update(cx, |list, cx| {
            list.set_conversation(messages, awaiting, cx);
        });
    }
}

/// Flattens the tokio join result so a crashed or aborted worker reads as a failed fetch.
fn settle_reply<E: std::fmt::Debug>(
    joined: Result<ProviderResult<String>, E>,
) -> ProviderResult<String> {
    match joined {
        Ok(outcome) => outcome,
        Err(error) => Err(ProviderError::WorkerJoin {
            stage: "reply-worker-join",
            message: format!("{error:?}"),
        }),
    }
}

impl Render for ChatView {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();

        v_flex()
            .id("chat-view")
            .relative()
            .size_full()
            .min_h_0()
            .overflow_hidden()
            .bg(theme.background)
            .child(
                div()
                    .id("chat-view-message-list")
                    .flex_1()
                    .min_h_0()
                    .child(self.message_list.clone()),
            )
            .child(
                div()
                    .id("chat-view-message-input")
                    .flex_shrink_0()
                    .w_full()
                    .child(self.message_input.clone()),
            )
    }
}

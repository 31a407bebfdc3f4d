use gpui::*;
use gpui_component::{ActiveTheme, h_flex, label::Label, v_flex};

use crate::chat::message::{Message, Sender};
use crate::chat::scroll_manager::ScrollManager;

pub const EMPTY_PLACEHOLDER: &str = "Похоже, запросов сообщений еще не было";
pub const TYPING_INDICATOR: &str = "Бот печатает...";

const CONTENT_MAX_WIDTH: Pixels = px(600.);
const AVATAR_SIZE: Pixels = px(38.);
const BUBBLE_RADIUS: Pixels = px(18.);
const USER_AVATAR_COLOR: u32 = 0x3b82f6;
const BOT_ACCENT_COLOR: u32 = 0xfbbf24;
const BUBBLE_COLOR: u32 = 0x23272f;
const USER_TEXT_COLOR: u32 = 0xffffff;

/// Presentation attributes that distinguish the two senders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SenderStyle {
    pub icon: &'static str,
    pub avatar_color: u32,
    pub text_color: u32,
    pub align_end: bool,
}

impl SenderStyle {
    pub const fn for_sender(sender: Sender) -> Self {
        match sender {
            Sender::User => Self {
                icon: "🧑",
                avatar_color: USER_AVATAR_COLOR,
                text_color: USER_TEXT_COLOR,
                align_end: true,
            },
            Sender::Bot => Self {
                icon: "🤖",
                avatar_color: BOT_ACCENT_COLOR,
                text_color: BOT_ACCENT_COLOR,
                align_end: false,
            },
        }
    }
}

/// One visual row of the transcript, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationRow {
    EmptyPlaceholder,
    Message(usize),
    TypingIndicator,
}

/// Rows to draw for a conversation: the placeholder only when nothing was sent,
/// every message in order, then the typing indicator while a reply is awaited.
pub fn conversation_rows(messages: &[Message], awaiting: bool) -> Vec<ConversationRow> {
    let mut rows = Vec::with_capacity(messages.len() + 1);
    if messages.is_empty() {
        rows.push(ConversationRow::EmptyPlaceholder);
    }
    rows.extend((0..messages.len()).map(ConversationRow::Message));
    if awaiting {
        rows.push(ConversationRow::TypingIndicator);
    }
    rows
}

/// Scrollable conversation transcript with the typing indicator appended while awaiting.
pub struct MessageList {
    messages: Vec<Message>,
    awaiting: bool,
    scroll_manager: ScrollManager,
}

impl MessageList {
    pub fn new(_cx: &mut Context<Self>) -> Self {
        Self {
            messages: Vec::new(),
            awaiting: false,
            scroll_manager: ScrollManager::new(),
        }
    }

    pub fn set_conversation(
        &mut self,
        messages: Vec<Message>,
        awaiting: bool,
        cx: &mut Context<Self>,
    ) {
        self.messages = messages;
        self.awaiting = awaiting;
        self.scroll_manager.observe(self.messages.len(), awaiting);
        cx.notify();
    }

    fn render_empty_state(&self, cx: &Context<Self>) -> AnyElement {
        let theme = cx.theme();

        h_flex()
            .w_full()
            .mt(px(80.))
            .justify_center()
            .child(
                Label::new(EMPTY_PLACEHOLDER)
                    .text_size(px(22.))
                    .text_color(theme.foreground.opacity(0.7)),
            )
            .into_any_element()
    }

    fn render_typing_row(&self) -> AnyElement {
        let style = SenderStyle::for_sender(Sender::Bot);

        h_flex()
            .w_full()
            .gap_3()
            .items_center()
            .justify_start()
            .child(render_avatar(style))
            .child(
                Label::new(TYPING_INDICATOR)
                    .text_size(px(16.))
                    .text_color(rgb(BOT_ACCENT_COLOR)),
            )
            .into_any_element()
    }
}

fn render_avatar(style: SenderStyle) -> impl IntoElement {
    div()
        .size(AVATAR_SIZE)
        .flex_shrink_0()
        .rounded_full()
        .bg(rgb(style.avatar_color))
        .flex()
        .items_center()
        .justify_center()
        .text_size(px(20.))
        .child(style.icon)
}

fn render_message_row(message: &Message) -> AnyElement {
    let style = SenderStyle::for_sender(message.sender);

    let bubble = div()
        .max_w(relative(0.8))
        .px(px(18.))
        .py(px(12.))
        .rounded(BUBBLE_RADIUS)
        .bg(rgb(BUBBLE_COLOR))
        .child(
            Label::new(message.text.clone())
                .text_size(px(16.))
                .text_color(rgb(style.text_color)),
        );

    // Users sit on the right with the avatar outermost, the bot mirrors that on the left.
    let row = h_flex().w_full().gap_3().items_end().py_1();
    if style.align_end {
        row.justify_end()
            .child(bubble)
            .child(render_avatar(style))
            .into_any_element()
    } else {
        row.justify_start()
            .child(render_avatar(style))
            .child(bubble)
            .into_any_element()
    }
}

impl Render for MessageList {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        self.scroll_manager.apply_pending_scroll();

        let rows = conversation_rows(&self.messages, self.awaiting)
            .into_iter()
            .map(|row| match row {
                ConversationRow::EmptyPlaceholder => self.render_empty_state(cx),
                ConversationRow::Message(index) => render_message_row(&self.messages[index]),
                ConversationRow::TypingIndicator => self.render_typing_row(),
            })
            .collect::<Vec<_>>();

        div()
            .id("message-list")
            .size_full()
            .min_h_0()
            .overflow_y_scroll()
            .track_scroll(self.scroll_manager.handle())
            .px_4()
            .pt_4()
            .pb(px(32.))
            .child(
                v_flex()
                    .w_full()
                    .max_w(CONTENT_MAX_WIDTH)
                    .mx_auto()
                    .gap_2()
                    .children(rows),
            )
    }
}

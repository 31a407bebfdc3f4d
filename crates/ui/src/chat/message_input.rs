use gpui::*;
use gpui_component::{
    ActiveTheme, Disableable as _, Sizable,
    button::{Button, ButtonVariants},
    h_flex,
    input::{Input, InputEvent, InputState},
};

use crate::chat::events::{DraftEdited, Submit};

pub const COMPOSER_PLACEHOLDER: &str = "Как Grok может помочь?";
const SEND_GLYPH: &str = "⏺";
const AWAITING_GLYPH: &str = "...";

/// Single-line composer. Edits emit [`DraftEdited`]; Enter or the send button emits [`Submit`].
pub struct MessageInput {
    input_state: Entity<InputState>,
    is_awaiting: bool,
    pending_clear: bool,
}

impl EventEmitter<Submit> for MessageInput {}
impl EventEmitter<DraftEdited> for MessageInput {}

impl MessageInput {
    pub fn new(window: &mut Window, cx: &mut Context<Self>) -> Self {
        let input_state =
            cx.new(|cx| InputState::new(window, cx).placeholder(COMPOSER_PLACEHOLDER));

        cx.subscribe_in(
            &input_state,
            window,
            |this, _, event: &InputEvent, _window, cx| match event {
                InputEvent::PressEnter { secondary: false } => this.handle_submit(cx),
                InputEvent::Change { .. } => {
                    let content = this.input_state.read(cx).value().to_string();
                    cx.emit(DraftEdited::new(content));
                    cx.notify();
                }
                _ => {}
            },
        )
        .detach();

        Self {
            input_state,
            is_awaiting: false,
            pending_clear: false,
        }
    }

    pub fn set_awaiting(&mut self, awaiting: bool, cx: &mut Context<Self>) {
        self.is_awaiting = awaiting;
        cx.notify();
    }

    /// Clears the composer on the next frame, where a window is available.
    pub fn request_clear(&mut self, cx: &mut Context<Self>) {
        self.pending_clear = true;
        cx.notify();
    }

    fn draft_is_blank(&self, cx: &App) -> bool {
        self.input_state.read(cx).value().trim().is_empty()
    }

    fn handle_submit(&mut self, cx: &mut Context<Self>) {
        if self.is_awaiting || self.draft_is_blank(cx) {
            return;
        }

        let content = self.input_state.read(cx).value().to_string();
        cx.emit(Submit::new(content));
    }
}

impl Render for MessageInput {
    fn render(&mut self, window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        if self.pending_clear {
            self.pending_clear = false;
            self.input_state.update(cx, |state, cx| {
                state.set_value("", window, cx);
            });
        }

        let theme = cx.theme();
        let is_awaiting = self.is_awaiting;
        let send_disabled = is_awaiting || self.draft_is_blank(cx);

        h_flex()
            .w_full()
            .justify_center()
            .py(px(24.))
            .bg(theme.secondary)
            .border_t_1()
            .border_color(theme.border)
            .child(
                h_flex()
                    .w_full()
                    .max_w(px(600.))
                    .gap_3()
                    .items_center()
                    .child(
                        div()
                            .flex_1()
                            .min_w(px(180.))
                            .child(Input::new(&self.input_state).w_full().disabled(is_awaiting)),
                    )
                    .child(
                        Button::new("send")
                            .primary()
                            .large()
                            .child(if is_awaiting { AWAITING_GLYPH } else { SEND_GLYPH })
                            .disabled(send_disabled)
                            .on_click(cx.listener(|this, _, _window, cx| {
                                this.handle_submit(cx);
                            })),
                    ),
            )
    }
}

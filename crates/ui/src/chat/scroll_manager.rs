use gpui::ScrollHandle;

/// Detects list changes that should pull the view to the latest entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FollowTrigger {
    message_count: usize,
    awaiting: bool,
}

impl FollowTrigger {
    /// Records the new state and reports whether it differs from the last one.
    pub fn observe(&mut self, message_count: usize, awaiting: bool) -> bool {
        let changed = self.message_count != message_count || self.awaiting != awaiting;
        self.message_count = message_count;
        self.awaiting = awaiting;
        changed
    }
}

/// Keeps the message list pinned to its tail whenever the conversation changes.
pub struct ScrollManager {
    scroll_handle: ScrollHandle,
    trigger: FollowTrigger,
    pending_scroll_to_bottom: bool,
}

impl ScrollManager {
    pub fn new() -> Self {
        Self {
            scroll_handle: ScrollHandle::new(),
            trigger: FollowTrigger::default(),
            // Restored history opens at its latest entry.
            pending_scroll_to_bottom: true,
        }
    }

    pub fn handle(&self) -> &ScrollHandle {
        &self.scroll_handle
    }

    pub fn observe(&mut self, message_count: usize, awaiting: bool) {
        if self.trigger.observe(message_count, awaiting) {
            self.pending_scroll_to_bottom = true;
        }
    }

    pub fn apply_pending_scroll(&mut self) -> bool {
        if !self.pending_scroll_to_bottom {
            return false;
        }

        self.scroll_handle.scroll_to_bottom();
        self.pending_scroll_to_bottom = false;
        true
    }
}

impl Default for ScrollManager {
    fn default() -> Self {
        Self::new()
    }
}

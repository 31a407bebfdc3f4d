/// Emitted when the user submits the composer contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submit {
    pub content: String,
}

impl Submit {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// Emitted whenever the composer text changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftEdited {
    pub content: String,
}

impl DraftEdited {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

use serde::{Deserialize, Serialize};
use snafu::Snafu;

/// Path of the assistant endpoint, relative to the configured base URL.
pub const REPLY_ENDPOINT_PATH: &str = "/assistant/openai_search";

/// Speaker role as understood by the assistant endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One role-tagged entry of the conversation sent upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
}

impl Turn {
    pub fn new(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(TurnRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(TurnRole::Assistant, content)
    }
}

/// Request body: the full history, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReplyRequest {
    pub messages: Vec<Turn>,
}

impl ReplyRequest {
    pub fn new(messages: Vec<Turn>) -> Self {
        Self { messages }
    }
}

/// Response body returned by the assistant endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyResponse {
    pub response: String,
}

pub use futures::future::BoxFuture;
pub type ProviderResult<T> = Result<T, ProviderError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ProviderError {
    #[snafu(display("reply endpoint base URL '{base_url}' is invalid"))]
    InvalidEndpoint {
        stage: &'static str,
        base_url: String,
    },
    #[snafu(display("failed to build http client on `{stage}`, {source}"))]
    BuildClient {
        stage: &'static str,
        source: reqwest::Error,
    },
    #[snafu(display("reply request to {url} failed on `{stage}`, {source}"))]
    SendRequest {
        stage: &'static str,
        url: String,
        source: reqwest::Error,
    },
    #[snafu(display("reply endpoint returned status {status}: {body}"))]
    ReplyStatus {
        stage: &'static str,
        status: u16,
        body: String,
    },
    #[snafu(display("failed to read reply body on `{stage}`, {source}"))]
    ReadReply {
        stage: &'static str,
        source: reqwest::Error,
    },
    #[snafu(display("failed to decode reply payload on `{stage}`, {source}"))]
    DecodeReply {
        stage: &'static str,
        source: serde_json::Error,
    },
    #[snafu(display("reply worker stopped before completion: {message}"))]
    WorkerJoin {
        stage: &'static str,
        message: String,
    },
}

/// Issues one reply request per user turn.
///
/// Implementations must not retry; any failure is reported once and the
/// caller substitutes its fallback text.
pub trait ReplyClient: Send + Sync {
    fn fetch_reply<'a>(&'a self, request: ReplyRequest) -> BoxFuture<'a, ProviderResult<String>>;
}

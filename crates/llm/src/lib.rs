use std::sync::Arc;

mod http;
mod provider;

pub use http::{DEFAULT_ENDPOINT, HttpReplyClient};
pub use provider::{
    BoxFuture, ProviderError, ProviderResult, REPLY_ENDPOINT_PATH, ReplyClient, ReplyRequest,
    ReplyResponse, Turn, TurnRole,
};

pub fn create_client(base_url: &str) -> ProviderResult<Arc<dyn ReplyClient>> {
    Ok(Arc::new(HttpReplyClient::new(base_url)?))
}

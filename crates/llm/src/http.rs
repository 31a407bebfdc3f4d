use snafu::{ResultExt, ensure};

use super::provider::{
    BoxFuture, BuildClientSnafu, DecodeReplySnafu, InvalidEndpointSnafu, ProviderResult,
    REPLY_ENDPOINT_PATH, ReadReplySnafu, ReplyClient, ReplyRequest, ReplyResponse,
    ReplyStatusSnafu, SendRequestSnafu,
};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000";

/// Reply client that POSTs the conversation to the assistant endpoint.
#[derive(Debug, Clone)]
pub struct HttpReplyClient {
    client: reqwest::Client,
    url: String,
}

impl HttpReplyClient {
    pub fn new(base_url: &str) -> ProviderResult<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        ensure!(
            base_url.starts_with("http://") || base_url.starts_with("https://"),
            InvalidEndpointSnafu {
                stage: "http-client-new",
                base_url: base_url.to_string(),
            }
        );

        let client = reqwest::Client::builder()
            .build()
            .context(BuildClientSnafu {
                stage: "http-client-build",
            })?;

        Ok(Self {
            client,
            url: format!("{base_url}{REPLY_ENDPOINT_PATH}"),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn post_reply(&self, request: ReplyRequest) -> ProviderResult<String> {
        tracing::debug!(
            url = %self.url,
            turns = request.messages.len(),
            "sending reply request"
        );

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .context(SendRequestSnafu {
                stage: "send-reply-request",
                url: self.url.clone(),
            })?;

        let status = response.status();
        let payload = response.text().await.context(ReadReplySnafu {
            stage: "read-reply-response",
        })?;

        if !status.is_success() {
            return ReplyStatusSnafu {
                stage: "reply-http-status",
                status: status.as_u16(),
                body: payload,
            }
            .fail();
        }

        let parsed: ReplyResponse = serde_json::from_str(&payload).context(DecodeReplySnafu {
            stage: "decode-reply-response",
        })?;

        Ok(parsed.response)
    }
}

impl ReplyClient for HttpReplyClient {
    fn fetch_reply<'a>(&'a self, request: ReplyRequest) -> BoxFuture<'a, ProviderResult<String>> {
        Box::pin(self.post_reply(request))
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use super::*;
    use crate::provider::{ProviderError, Turn};

    /// Serves exactly one canned HTTP response and hands back the raw request.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let address = listener.local_addr().expect("local addr");

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut raw = Vec::new();
            let mut buffer = [0u8; 1024];

            loop {
                let read = socket.read(&mut buffer).await.expect("read");
                if read == 0 {
                    break;
                }
                raw.extend_from_slice(&buffer[..read]);
                if request_complete(&raw) {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.expect("write");
            socket.shutdown().await.ok();

            String::from_utf8(raw).expect("utf8 request")
        });

        (format!("http://{address}"), handle)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };

        let content_length = text[..header_end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.trim()
                    .eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);

        raw.len() >= header_end + 4 + content_length
    }

    fn request_body(raw: &str) -> serde_json::Value {
        let (_, body) = raw.split_once("\r\n\r\n").expect("request body");
        serde_json::from_str(body).expect("json body")
    }

    #[test]
    fn rejects_endpoint_without_scheme() {
        let error = HttpReplyClient::new("localhost:8000").expect_err("missing scheme");
        assert!(matches!(error, ProviderError::InvalidEndpoint { .. }));
    }

    #[test]
    fn joins_base_url_and_endpoint_path() {
        let client = HttpReplyClient::new("http://localhost:8000/").expect("client");
        assert_eq!(client.url(), "http://localhost:8000/assistant/openai_search");
    }

    #[tokio::test]
    async fn posts_history_and_returns_reply_field() {
        let (base_url, server) = serve_once("200 OK", r#"{"response":"hi there"}"#).await;
        let client = HttpReplyClient::new(&base_url).expect("client");

        let reply = client
            .fetch_reply(ReplyRequest::new(vec![Turn::user("hello")]))
            .await
            .expect("reply");
        assert_eq!(reply, "hi there");

        let raw = server.await.expect("server task");
        assert!(raw.starts_with("POST /assistant/openai_search HTTP/1.1"));
        assert_eq!(
            request_body(&raw),
            serde_json::json!({ "messages": [{ "role": "user", "content": "hello" }] })
        );
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let (base_url, server) =
            serve_once("500 Internal Server Error", r#"{"detail":"upstream failed"}"#).await;
        let client = HttpReplyClient::new(&base_url).expect("client");

        let error = client
            .fetch_reply(ReplyRequest::new(vec![Turn::user("hello")]))
            .await
            .expect_err("status error");
        assert!(matches!(error, ProviderError::ReplyStatus { status: 500, .. }));
        server.await.expect("server task");
    }

    #[tokio::test]
    async fn missing_reply_field_is_an_error() {
        let (base_url, server) = serve_once("200 OK", r#"{"answer":"hi"}"#).await;
        let client = HttpReplyClient::new(&base_url).expect("client");

        let error = client
            .fetch_reply(ReplyRequest::new(vec![Turn::user("hello")]))
            .await
            .expect_err("decode error");
        assert!(matches!(error, ProviderError::DecodeReply { .. }));
        server.await.expect("server task");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_an_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let address = listener.local_addr().expect("local addr");
        drop(listener);

        let client = HttpReplyClient::new(&format!("http://{address}")).expect("client");
        let error = client
            .fetch_reply(ReplyRequest::new(vec![Turn::user("hello")]))
            .await
            .expect_err("connection error");
        assert!(matches!(error, ProviderError::SendRequest { .. }));
    }
}

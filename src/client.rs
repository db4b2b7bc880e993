//! HTTP client for the assistant backend's streaming endpoints.

use std::pin::Pin;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{BackendConfig, StreamConfig};
use crate::error::ClientError;
use crate::stream::StreamIngestor;

/// Error bodies are cut to this many characters.
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Response body as a byte stream.
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>;

/// Ingestor over a backend response body.
pub type ResponseIngestor = StreamIngestor<BodyStream>;

/// One turn of prior conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Body of a chat request.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub text: String,
    /// Base64 data URL of an attached image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub chat_history: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_prompt: Option<String>,
}

impl ChatRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// Body of a screenshot analysis request.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotRequest {
    /// Base64 data URLs, one per captured display.
    pub images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_prompt: Option<String>,
}

pub struct BackendClient {
    client: reqwest::Client,
    config: BackendConfig,
    stream_config: StreamConfig,
}

impl BackendClient {
    pub fn new(config: BackendConfig, stream_config: StreamConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self {
            client,
            config,
            stream_config,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    /// Start a streamed chat completion.
    pub async fn stream_chat(&self, mut request: ChatRequest) -> Result<ResponseIngestor, ClientError> {
        request
            .model
            .get_or_insert_with(|| self.config.model.clone());
        debug!(
            history = request.chat_history.len(),
            has_image = request.image.is_some(),
            "Sending chat request"
        );
        self.post_stream(&self.config.chat_path, &request).await
    }

    /// Start a streamed screenshot analysis.
    pub async fn stream_screenshot(
        &self,
        mut request: ScreenshotRequest,
    ) -> Result<ResponseIngestor, ClientError> {
        request
            .model
            .get_or_insert_with(|| self.config.model.clone());
        debug!(images = request.images.len(), "Sending screenshot request");
        self.post_stream(&self.config.screenshot_path, &request).await
    }

    async fn post_stream<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<ResponseIngestor, ClientError> {
        let mut builder = self.client.post(self.url(path)).json(body);
        if let Some(token) = &self.config.auth_token {
            builder = builder.bearer_auth(token.expose_secret());
        }

        let resp = builder.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(status_error(status, body));
        }

        let source: BodyStream = resp.bytes_stream().boxed();
        Ok(StreamIngestor::new(source, self.stream_config.clone()))
    }
}

fn status_error(status: StatusCode, body: String) -> ClientError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => {
            warn!("Backend usage limit reached");
            ClientError::UsageLimitExceeded
        }
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
        _ => {
            let body: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
            warn!(status = status.as_u16(), "Backend request failed: {body}");
            ClientError::Http {
                status: status.as_u16(),
                body,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{StreamEvent, StreamOutcome};
    use secrecy::SecretString;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, token: Option<&str>) -> BackendClient {
        let config = BackendConfig {
            base_url: server.uri(),
            auth_token: token.map(|t| SecretString::from(t.to_string())),
            ..BackendConfig::default()
        };
        BackendClient::new(config, StreamConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn chat_streams_events() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat_protected"))
            .and(header("authorization", "Bearer secret-token"))
            .and(body_partial_json(json!({
                "text": "hello",
                "model": "gemini-1.5-flash",
                "chatHistory": [{"role": "user", "content": "earlier"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "data: {\"chunk\":\"Hi\"}\ndata: {\"chunk\":\" there\"}\ndata: {\"complete\":true}\n",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Some("secret-token"));
        let mut request = ChatRequest::new("hello");
        request.chat_history.push(ChatMessage::user("earlier"));

        let ingestor = client.stream_chat(request).await.unwrap();
        let mut events = Vec::new();
        let outcome = ingestor.ingest(&mut events).await.unwrap();

        assert_eq!(outcome, StreamOutcome::Completed);
        assert_eq!(
            events,
            vec![
                StreamEvent::Chunk("Hi".into()),
                StreamEvent::Chunk(" there".into()),
                StreamEvent::Complete
            ]
        );
    }

    #[tokio::test]
    async fn screenshot_sends_images() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/screenshot_protected"))
            .and(body_partial_json(json!({
                "images": ["data:image/png;base64,AAAA"],
                "customPrompt": "Be brief"
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("data: {\"error\":\"model overloaded\"}\n"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        let request = ScreenshotRequest {
            images: vec!["data:image/png;base64,AAAA".into()],
            custom_prompt: Some("Be brief".into()),
            ..ScreenshotRequest::default()
        };

        let mut events = Vec::new();
        let outcome = client
            .stream_screenshot(request)
            .await
            .unwrap()
            .ingest(&mut events)
            .await
            .unwrap();
        assert_eq!(outcome, StreamOutcome::Failed("model overloaded".into()));
    }

    #[tokio::test]
    async fn usage_limit_maps_to_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(429).set_body_json(json!({"error": "Usage limit exceeded"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server, Some("t"));
        let result = client.stream_chat(ChatRequest::new("hi")).await;
        assert!(matches!(result, Err(ClientError::UsageLimitExceeded)));
    }

    #[tokio::test]
    async fn unauthorized_and_other_statuses() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat_protected"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/screenshot_protected"))
            .respond_with(ResponseTemplate::new(500).set_body_string("x".repeat(2000)))
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        assert!(matches!(
            client.stream_chat(ChatRequest::new("hi")).await,
            Err(ClientError::Unauthorized)
        ));
        match client.stream_screenshot(ScreenshotRequest::default()).await {
            Err(ClientError::Http { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body.len(), MAX_ERROR_BODY_CHARS);
            }
            Err(other) => panic!("expected Http error, got {other}"),
            Ok(_) => panic!("expected Http error, got a stream"),
        }
    }

    #[test]
    fn request_serializes_camel_case() {
        let mut request = ChatRequest::new("q");
        request.custom_prompt = Some("p".into());
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["text"], "q");
        assert_eq!(json["customPrompt"], "p");
        assert!(json["chatHistory"].as_array().unwrap().is_empty());
        assert!(json.get("image").is_none());
    }
}

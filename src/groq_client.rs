use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

use crate::conversation::Message;

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama3-8b-8192";

/// Body of a chat completions call.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(String),

    #[error("no reply within {0:?}")]
    Timeout(Duration),

    #[error("provider rejected the API key: {0}")]
    Auth(String),

    #[error("provider rate limit reached: {0}")]
    RateLimit(String),

    #[error("provider returned {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("provider returned an empty reply")]
    EmptyReply,
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClientError::MalformedResponse(e.to_string())
        } else {
            ClientError::Network(e.to_string())
        }
    }
}

/// A remote text generator: request in, reply text out.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn generate(&self, request: &ChatRequest) -> Result<String, ClientError>;
}

/// Client for Groq's OpenAI-compatible chat completions endpoint.
pub struct GroqClient {
    api_key: String,
    endpoint: String,
    client: reqwest::Client,
}

impl GroqClient {
    pub fn new(api_key: impl Into<String>, base_url: &Url) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("media-chat/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            api_key: api_key.into(),
            endpoint: format!("{}/chat/completions", base_url.as_str().trim_end_matches('/')),
            client,
        })
    }
}

#[async_trait]
impl CompletionProvider for GroqClient {
    async fn generate(&self, request: &ChatRequest) -> Result<String, ClientError> {
        // Log the request for debugging
        if let Ok(body) = serde_json::to_string_pretty(request) {
            debug!("Sending request to Groq API: {}", body);
        }

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "API request failed with response: {}", error_text);
            return Err(classify_failure(status.as_u16(), &error_text));
        }

        let response_json: Value = response.json().await?;

        let usage = response_json.get("usage").cloned().unwrap_or_default();
        debug!(usage = %usage, "Received response from Groq API");

        extract_reply(&response_json)
    }
}

fn classify_failure(status: u16, body: &str) -> ClientError {
    let message = provider_message(body);
    match status {
        401 | 403 => ClientError::Auth(message),
        429 => ClientError::RateLimit(message),
        _ => ClientError::Provider { status, message },
    }
}

/// Pulls `error.message` out of an error body, or returns the body as is.
fn provider_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.pointer("/error/message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

fn extract_reply(response: &Value) -> Result<String, ClientError> {
    let choices = response
        .get("choices")
        .and_then(Value::as_array)
        .ok_or_else(|| ClientError::MalformedResponse("missing choices".to_string()))?;

    let first = choices
        .first()
        .ok_or_else(|| ClientError::MalformedResponse("no choices returned".to_string()))?;

    let content = first
        .pointer("/message/content")
        .and_then(Value::as_str)
        .ok_or_else(|| ClientError::MalformedResponse("choice has no message content".to_string()))?;

    if content.trim().is_empty() {
        return Err(ClientError::EmptyReply);
    }

    Ok(content.to_string())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn request() -> ChatRequest {
        ChatRequest {
            model: DEFAULT_MODEL.to_string(),
            messages: vec![Message::system("persona"), Message::user("febre")],
            temperature: 0.5,
            max_tokens: 512,
        }
    }

    async fn client_for(server: &MockServer) -> GroqClient {
        let base = Url::parse(&server.uri()).unwrap();
        GroqClient::new("test-key", &base).unwrap()
    }

    #[tokio::test]
    async fn posts_messages_and_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": DEFAULT_MODEL,
                "messages": [
                    {"role": "system", "content": "persona"},
                    {"role": "user", "content": "febre"}
                ],
                "max_tokens": 512
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "chatcmpl-1",
                "choices": [
                    {"index": 0, "message": {"role": "assistant", "content": "Há quanto tempo?"}}
                ],
                "usage": {"prompt_tokens": 10, "completion_tokens": 4, "total_tokens": 14}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = client_for(&server).await.generate(&request()).await.unwrap();

        assert_eq!(reply, "Há quanto tempo?");
    }

    #[tokio::test]
    async fn reply_without_usage_block_is_accepted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "Tem tosse?"}}]
            })))
            .mount(&server)
            .await;

        let reply = client_for(&server).await.generate(&request()).await.unwrap();

        assert_eq!(reply, "Tem tosse?");
    }

    #[tokio::test]
    async fn unauthorized_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": {"message": "Invalid API Key", "type": "invalid_request_error"}
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).await.generate(&request()).await.unwrap_err();

        match err {
            ClientError::Auth(message) => assert_eq!(message, "Invalid API Key"),
            other => panic!("expected auth error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn too_many_requests_is_rate_limit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let err = client_for(&server).await.generate(&request()).await.unwrap_err();

        assert!(matches!(err, ClientError::RateLimit(ref m) if m == "slow down"));
    }

    #[tokio::test]
    async fn server_error_keeps_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let err = client_for(&server).await.generate(&request()).await.unwrap_err();

        assert!(matches!(err, ClientError::Provider { status: 503, .. }));
    }

    #[tokio::test]
    async fn unreachable_provider_is_network_error() {
        let base = Url::parse("http://127.0.0.1:9").unwrap();
        let client = GroqClient::new("test-key", &base).unwrap();

        let err = client.generate(&request()).await.unwrap_err();

        assert!(matches!(err, ClientError::Network(_)));
    }

    #[test]
    fn reply_without_choices_is_malformed() {
        assert!(matches!(
            extract_reply(&json!({"choices": []})),
            Err(ClientError::MalformedResponse(_))
        ));
        assert!(matches!(
            extract_reply(&json!({"object": "error"})),
            Err(ClientError::MalformedResponse(_))
        ));
    }

    #[test]
    fn blank_content_is_empty_reply() {
        let response = json!({"choices": [{"message": {"role": "assistant", "content": "  "}}]});
        assert!(matches!(extract_reply(&response), Err(ClientError::EmptyReply)));
    }
}

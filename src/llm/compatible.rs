//! Generator for backends that speak the OpenAI-compatible chat completions
//! API. Also accepts the flatter `{"response": ...}` / `{"result": ...}`
//! envelopes some inference gateways return.

use super::scrub::{api_error, sanitize_api_error};
use super::traits::{GenerateFuture, Generator};
use super::types::{PromptMessage, payload_to_text};
use crate::error::GenerationError;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

const PROVIDER_NAME: &str = "openai-compatible";

pub struct OpenAiCompatibleGenerator {
    model: String,
    temperature: f64,
    /// Pre-computed `Authorization` header value.
    cached_auth: Option<String>,
    /// Pre-computed chat completions URL.
    cached_chat_url: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

impl OpenAiCompatibleGenerator {
    pub fn new(
        base_url: &str,
        api_key: Option<&str>,
        model: &str,
        temperature: f64,
        client: Client,
    ) -> Self {
        let base_url = base_url.trim_end_matches('/');
        let cached_chat_url = if base_url.ends_with("chat/completions") {
            base_url.to_string()
        } else {
            format!("{base_url}/chat/completions")
        };

        Self {
            model: model.to_string(),
            temperature,
            cached_auth: api_key
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(|k| format!("Bearer {k}")),
            cached_chat_url,
            client,
        }
    }

    pub fn chat_completions_url(&self) -> &str {
        &self.cached_chat_url
    }

    async fn call_api(&self, messages: &[PromptMessage]) -> Result<String, GenerationError> {
        let request = ChatRequest {
            model: &self.model,
            messages: messages
                .iter()
                .map(|m| Message {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            temperature: self.temperature,
        };

        let mut builder = self.client.post(&self.cached_chat_url).json(&request);
        if let Some(auth) = &self.cached_auth {
            builder = builder.header("Authorization", auth);
        }

        let response = builder.send().await.map_err(|e| GenerationError::Request {
            provider: PROVIDER_NAME.to_string(),
            message: sanitize_api_error(&e.to_string()),
        })?;

        if !response.status().is_success() {
            return Err(api_error(PROVIDER_NAME, response).await);
        }

        let body: Value = response.json().await.map_err(|e| GenerationError::Request {
            provider: PROVIDER_NAME.to_string(),
            message: format!("unreadable response body: {}", sanitize_api_error(&e.to_string())),
        })?;

        extract_completion_text(&body).ok_or_else(|| GenerationError::EmptyOutput {
            provider: PROVIDER_NAME.to_string(),
        })
    }
}

/// Pull generated text out of a completion payload.
///
/// Checked in order: `choices[0].message.content`, `response`,
/// `result.response`, `result`, `text`. The first candidate that yields
/// non-empty text wins.
pub fn extract_completion_text(body: &Value) -> Option<String> {
    let candidates = [
        body.pointer("/choices/0/message/content"),
        body.get("response"),
        body.pointer("/result/response"),
        body.get("result"),
        body.get("text"),
    ];
    candidates.into_iter().flatten().find_map(payload_to_text)
}

impl Generator for OpenAiCompatibleGenerator {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn generate<'a>(&'a self, messages: &'a [PromptMessage]) -> GenerateFuture<'a> {
        Box::pin(self.call_api(messages))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::http_client::build_provider_client_with_timeout;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_generator(url: &str, key: Option<&str>) -> OpenAiCompatibleGenerator {
        OpenAiCompatibleGenerator::new(
            url,
            key,
            "test-model",
            0.2,
            build_provider_client_with_timeout(5),
        )
    }

    #[test]
    fn chat_url_appends_path_once() {
        let g = make_generator("https://api.example.com/v1/", None);
        assert_eq!(
            g.chat_completions_url(),
            "https://api.example.com/v1/chat/completions"
        );

        let g = make_generator("https://api.example.com/v1/chat/completions", None);
        assert_eq!(
            g.chat_completions_url(),
            "https://api.example.com/v1/chat/completions"
        );
    }

    #[test]
    fn blank_key_sends_no_auth() {
        let g = make_generator("http://localhost", Some("   "));
        assert!(g.cached_auth.is_none());
    }

    #[test]
    fn extracts_openai_shape() {
        let body = json!({"choices": [{"message": {"role": "assistant", "content": " hi "}}]});
        assert_eq!(extract_completion_text(&body).as_deref(), Some("hi"));
    }

    #[test]
    fn extracts_flat_envelopes() {
        assert_eq!(
            extract_completion_text(&json!({"response": "a"})).as_deref(),
            Some("a")
        );
        assert_eq!(
            extract_completion_text(&json!({"result": {"response": "b"}})).as_deref(),
            Some("b")
        );
        assert_eq!(
            extract_completion_text(&json!({"text": "c"})).as_deref(),
            Some("c")
        );
    }

    #[test]
    fn object_response_is_serialized() {
        let body = json!({"response": {"action": "final"}});
        let text = extract_completion_text(&body).unwrap();
        assert!(text.contains("\"action\""));
    }

    #[test]
    fn empty_payload_yields_none() {
        assert!(extract_completion_text(&json!({"choices": []})).is_none());
        assert!(extract_completion_text(&json!({"response": "  "})).is_none());
    }

    #[tokio::test]
    async fn sends_bearer_and_reads_content() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer secret-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "{\"type\":\"5xx\"}"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let g = make_generator(&server.uri(), Some("secret-key"));
        let text = g
            .generate(&[PromptMessage::system("sys"), PromptMessage::user("hello")])
            .await
            .unwrap();
        assert_eq!(text, "{\"type\":\"5xx\"}");
    }

    #[tokio::test]
    async fn empty_completion_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let g = make_generator(&server.uri(), None);
        let err = g.generate(&[PromptMessage::user("x")]).await.unwrap_err();
        assert!(matches!(err, GenerationError::EmptyOutput { .. }));
    }

    #[tokio::test]
    async fn error_messages_redact_sensitive_fields() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_string("{\"error\":\"invalid credentials api_key=raw-secret-123\"}"),
            )
            .mount(&server)
            .await;

        let g = make_generator(&server.uri(), Some("key"));
        let err = g
            .generate(&[PromptMessage::user("hello")])
            .await
            .unwrap_err()
            .to_string();

        assert!(!err.contains("raw-secret-123"));
        assert!(err.contains("[REDACTED]"));
        assert!(err.contains("401"));
    }
}

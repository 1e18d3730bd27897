use super::scrub::{api_error, sanitize_api_error};
use super::traits::{GenerateFuture, Generator};
use super::types::{PromptMessage, payload_to_text};
use crate::error::GenerationError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const PROVIDER_NAME: &str = "ollama";

pub struct OllamaGenerator {
    base_url: String,
    model: String,
    temperature: f64,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    stream: bool,
    options: Options,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct Options {
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Value,
}

impl OllamaGenerator {
    pub fn new(base_url: &str, model: &str, temperature: f64, client: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            temperature,
            client,
        }
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
            stream: false,
            options: Options {
                temperature: self.temperature,
            },
        };
        let url = format!("{}/api/chat", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::Request {
                provider: PROVIDER_NAME.to_string(),
                message: format!(
                    "{}. Is Ollama running?",
                    sanitize_api_error(&e.to_string())
                ),
            })?;

        if !response.status().is_success() {
            return Err(api_error(PROVIDER_NAME, response).await);
        }

        let chat: ChatResponse = response.json().await.map_err(|e| GenerationError::Request {
            provider: PROVIDER_NAME.to_string(),
            message: format!("unreadable response body: {}", sanitize_api_error(&e.to_string())),
        })?;

        chat.message
            .and_then(|m| payload_to_text(&m.content))
            .ok_or_else(|| GenerationError::EmptyOutput {
                provider: PROVIDER_NAME.to_string(),
            })
    }
}

impl Generator for OllamaGenerator {
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
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_generator(url: &str) -> OllamaGenerator {
        OllamaGenerator::new(url, "llama3", 0.2, build_provider_client_with_timeout(5))
    }

    #[test]
    fn custom_url_trailing_slash() {
        let g = make_generator("http://192.168.1.100:11434/");
        assert_eq!(g.base_url, "http://192.168.1.100:11434");
    }

    #[test]
    fn request_serializes_stream_false() {
        let req = ChatRequest {
            model: "llama3",
            messages: vec![Message {
                role: "system",
                content: "You are Pocket SRE",
            }],
            stream: false,
            options: Options { temperature: 0.2 },
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"stream\":false"));
        assert!(json.contains("\"temperature\":0.2"));
        assert!(json.contains("\"role\":\"system\""));
    }

    #[test]
    fn response_without_message_deserializes() {
        let resp: ChatResponse = serde_json::from_str(r#"{"done":true}"#).unwrap();
        assert!(resp.message.is_none());
    }

    #[tokio::test]
    async fn reads_message_content() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(json!({"model": "llama3", "stream": false})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": {"role": "assistant", "content": "  Hello from Ollama!  "}
            })))
            .mount(&server)
            .await;

        let g = make_generator(&server.uri());
        let text = g.generate(&[PromptMessage::user("hi")]).await.unwrap();
        assert_eq!(text, "Hello from Ollama!");
    }

    #[tokio::test]
    async fn blank_content_is_empty_output() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": {"role": "assistant", "content": ""}
            })))
            .mount(&server)
            .await;

        let g = make_generator(&server.uri());
        let err = g.generate(&[PromptMessage::user("hi")]).await.unwrap_err();
        assert!(matches!(err, GenerationError::EmptyOutput { .. }));
    }

    #[tokio::test]
    async fn server_error_is_request_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
            .mount(&server)
            .await;

        let g = make_generator(&server.uri());
        let err = g.generate(&[PromptMessage::user("hi")]).await.unwrap_err();
        assert!(err.to_string().contains("model not loaded"));
    }
}

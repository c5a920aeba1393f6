use std::time::Duration;

use log::{debug, warn};
use reqwest::blocking::{Client, Response};
use reqwest::header::{self, HeaderValue};
use serde::{Deserialize, Serialize};

use rewriter_core::config::LlmConfig;
use rewriter_core::{ChatModel, CompletionError};

use crate::base_url::chat_completions_url;
use crate::error::AdapterError;

/// Builds the chat model described by `config`. The API key falls back to
/// `OPENAI_API_KEY` when the config leaves it blank.
pub fn create_chat_model(config: &LlmConfig) -> Result<Box<dyn ChatModel>, AdapterError> {
    Ok(Box::new(OpenAiChatAdapter::new(config)?))
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint. Each call is
/// one request: no retries, no idempotency key.
#[derive(Debug)]
pub struct OpenAiChatAdapter {
    client: Client,
    url: String,
    api_key: Option<String>,
    model_name: String,
    temperature: f32,
}

impl OpenAiChatAdapter {
    pub fn new(config: &LlmConfig) -> Result<Self, AdapterError> {
        if config.model_name.trim().is_empty() {
            return Err(AdapterError::InvalidConfig(
                "model_name must not be empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout.map(Duration::from_secs))
            .build()?;

        Ok(Self {
            client,
            url: chat_completions_url(&config.base_url),
            api_key: config.resolved_api_key(),
            model_name: config.model_name.trim().to_string(),
            temperature: config.temperature,
        })
    }

    pub fn invoke(&self, system_prompt: &str, user_text: &str) -> Result<String, AdapterError> {
        let body = ChatCompletionRequest {
            model: &self.model_name,
            messages: [
                ChatMessageRequest {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessageRequest {
                    role: "user",
                    content: user_text,
                },
            ],
            temperature: self.temperature,
        };

        let mut request = self.client.post(&self.url).header(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        match self.api_key.as_deref() {
            Some(key) => request = request.bearer_auth(key),
            None => warn!("no API key configured; sending unauthenticated request"),
        }

        debug!("POST {} (model {})", self.url, self.model_name);
        let response = request.json(&body).send()?;
        handle_chat_response(response)
    }
}

impl ChatModel for OpenAiChatAdapter {
    fn complete(&self, system_prompt: &str, user_text: &str) -> Result<String, CompletionError> {
        self.invoke(system_prompt, user_text)
            .map_err(CompletionError::from)
    }
}

fn handle_chat_response(response: Response) -> Result<String, AdapterError> {
    let status = response.status();
    let body = response.text()?;
    if !status.is_success() {
        let message = api_error_message(&body).unwrap_or_else(|| {
            let reason = status.canonical_reason().unwrap_or("request failed");
            if body.trim().is_empty() {
                format!("{} {reason}", status.as_u16())
            } else {
                format!("{} {reason}: {}", status.as_u16(), body.trim())
            }
        });
        warn!("chat completion failed with {status}: {message}");
        return Err(AdapterError::HttpStatus { status, message });
    }

    let parsed: ChatCompletionResponse = serde_json::from_str(&body)?;
    first_choice_content(parsed).ok_or(AdapterError::EmptyResponse)
}

fn api_error_message(body: &str) -> Option<String> {
    let parsed: ApiErrorResponse = serde_json::from_str(body).ok()?;
    let message = parsed.error.message?;
    let trimmed = message.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn first_choice_content(response: ChatCompletionResponse) -> Option<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessageRequest<'a>; 2],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessageRequest<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn adapter_for(server: &MockServer) -> OpenAiChatAdapter {
        OpenAiChatAdapter::new(&LlmConfig {
            api_key: "sk-test".into(),
            base_url: server.base_url(),
            ..LlmConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn sends_system_and_user_messages_with_fixed_sampling() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .header("authorization", "Bearer sk-test")
                .json_body(json!({
                    "model": "gpt-4",
                    "messages": [
                        { "role": "system", "content": "Fix grammar." },
                        { "role": "user", "content": "i think its good" }
                    ],
                    "temperature": 0.7
                }));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "choices": [
                        { "index": 0, "message": { "role": "assistant", "content": "I think it is good." } },
                        { "index": 1, "message": { "role": "assistant", "content": "ignored" } }
                    ]
                }));
        });

        let text = adapter_for(&server)
            .complete("Fix grammar.", "i think its good")
            .unwrap();

        mock.assert();
        assert_eq!(text, "I think it is good.");
    }

    #[test]
    fn too_many_requests_is_rate_limited_without_retry() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(429).json_body(json!({
                "error": { "message": "Rate limit reached for gpt-4", "type": "requests" }
            }));
        });

        let err = adapter_for(&server).complete("s", "u").unwrap_err();

        assert_eq!(err, CompletionError::RateLimited);
        mock.assert_calls(1);
    }

    #[test]
    fn api_error_message_is_surfaced() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(401).json_body(json!({
                "error": { "message": "Incorrect API key provided.", "type": "invalid_request_error" }
            }));
        });

        let err = adapter_for(&server).complete("s", "u").unwrap_err();
        assert_eq!(
            err,
            CompletionError::Service("Incorrect API key provided.".into())
        );
    }

    #[test]
    fn plain_text_error_body_falls_back_to_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(503).body("upstream unavailable");
        });

        match adapter_for(&server).complete("s", "u").unwrap_err() {
            CompletionError::Service(message) => {
                assert!(message.starts_with("503"), "message: {message}");
                assert!(message.contains("upstream unavailable"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn malformed_or_empty_responses_are_unexpected() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200).body("not json");
        });
        assert!(matches!(
            adapter_for(&server).complete("s", "u"),
            Err(CompletionError::Other(_))
        ));

        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200).json_body(json!({ "choices": [] }));
        });
        assert!(matches!(
            adapter_for(&server).complete("s", "u"),
            Err(CompletionError::Other(_))
        ));
    }

    #[test]
    fn whitespace_reply_is_returned_as_is() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200).json_body(json!({
                "choices": [{ "message": { "role": "assistant", "content": "  \n" } }]
            }));
        });
        assert_eq!(adapter_for(&server).complete("s", "u").unwrap(), "  \n");

        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200).json_body(json!({
                "choices": [{ "message": { "role": "assistant", "content": null } }]
            }));
        });
        assert!(matches!(
            adapter_for(&server).complete("s", "u"),
            Err(CompletionError::Other(_))
        ));
    }

    #[test]
    fn unreachable_host_is_a_service_error() {
        let adapter = OpenAiChatAdapter::new(&LlmConfig {
            api_key: "sk-test".into(),
            base_url: "http://127.0.0.1:9/v1".into(),
            ..LlmConfig::default()
        })
        .unwrap();
        assert!(matches!(
            adapter.complete("s", "u"),
            Err(CompletionError::Service(_))
        ));
    }

    #[test]
    fn blank_model_is_rejected() {
        let config = LlmConfig {
            model_name: " ".into(),
            ..LlmConfig::default()
        };
        assert!(matches!(
            OpenAiChatAdapter::new(&config),
            Err(AdapterError::InvalidConfig(_))
        ));
    }
}

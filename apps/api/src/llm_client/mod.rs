//! Anthropic Messages API client and the `LlmProvider` seam.
//!
//! Generation code only sees `LlmProvider`: one prompt in, one response string
//! out. `LlmClient` is the production implementation; it retries rate limits
//! and server errors with exponential backoff and never parses content.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;
#[cfg(test)]
pub mod scripted;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for every generation call.
pub const MODEL: &str = "claude-sonnet-4-5";
/// Room for five posts and one long-form article in a single response.
const MAX_TOKENS: u32 = 8192;
const MAX_ATTEMPTS: u32 = 3;
const HTTP_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Gave up after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// One prompt in, one response string out. Parsing belongs to the caller.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn send(&self, prompt: &str, system: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

impl MessagesResponse {
    /// All text blocks, concatenated in order. `None` when there is no text at all.
    fn text(&self) -> Option<String> {
        let text: String = self
            .content
            .iter()
            .filter(|b| b.block_type == "text")
            .filter_map(|b| b.text.as_deref())
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Delay before retry number `attempt` (1-based): 1s, 2s, 4s, ...
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(1000 * (1u64 << attempt.saturating_sub(1).min(6)))
}

fn error_message(body: String) -> String {
    serde_json::from_str::<ApiErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}

#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
}

impl LlmClient {
    pub fn new(api_key: String) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(HTTP_TIMEOUT).build()?,
            api_key,
        })
    }

    async fn request(&self, body: &MessagesRequest<'_>) -> Result<MessagesResponse, LlmError> {
        let mut last_error = None;

        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                let delay = backoff_delay(attempt);
                warn!("LLM attempt {attempt} failed, retrying in {}ms", delay.as_millis());
                tokio::time::sleep(delay).await;
            }

            let response = match self
                .client
                .post(ANTHROPIC_API_URL)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(body)
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();
            if status.is_success() {
                return Ok(response.json().await?);
            }

            let message = error_message(response.text().await.unwrap_or_default());
            let err = LlmError::Api {
                status: status.as_u16(),
                message,
            };
            if !is_retryable(status) {
                return Err(err);
            }
            warn!("LLM API returned {status}: {err}");
            last_error = Some(err);
        }

        Err(last_error.unwrap_or(LlmError::RetriesExhausted {
            attempts: MAX_ATTEMPTS,
        }))
    }
}

#[async_trait]
impl LlmProvider for LlmClient {
    async fn send(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        let body = MessagesRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            system,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
        };
        let response = self.request(&body).await?;
        debug!(
            "LLM call succeeded: input_tokens={}, output_tokens={}, stop_reason={:?}",
            response.usage.input_tokens, response.usage.output_tokens, response.stop_reason
        );
        response.text().ok_or(LlmError::EmptyContent)
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
    else {
        return text;
    };
    let rest = rest.trim_start();
    rest.strip_suffix("```").map(str::trim).unwrap_or(rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n[\"idea\"]\n```";
        assert_eq!(strip_json_fences(input), "[\"idea\"]");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"content\": \"x\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"content\": \"x\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        assert_eq!(strip_json_fences("  [\"idea\"]  "), "[\"idea\"]");
    }

    #[test]
    fn test_response_text_joins_text_blocks() {
        let response: MessagesResponse = serde_json::from_str(
            r#"{
                "content": [
                    {"type": "text", "text": "[\"uno\", "},
                    {"type": "tool_use"},
                    {"type": "text", "text": "\"dos\"]"}
                ],
                "stop_reason": "end_turn",
                "usage": {"input_tokens": 10, "output_tokens": 5}
            }"#,
        )
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("[\"uno\", \"dos\"]"));
    }

    #[test]
    fn test_blank_response_has_no_text() {
        let response: MessagesResponse = serde_json::from_str(
            r#"{"content": [{"type": "text", "text": "  "}], "usage": {"input_tokens": 1, "output_tokens": 0}}"#,
        )
        .unwrap();
        assert!(response.text().is_none());
    }

    #[test]
    fn test_retry_policy() {
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable(StatusCode::BAD_GATEWAY));
        assert!(!is_retryable(StatusCode::BAD_REQUEST));
        assert!(!is_retryable(StatusCode::UNAUTHORIZED));
        assert_eq!(backoff_delay(1), Duration::from_secs(1));
        assert_eq!(backoff_delay(3), Duration::from_secs(4));
    }

    #[test]
    fn test_error_message_prefers_api_message() {
        let body = r#"{"type": "error", "error": {"type": "invalid_request_error", "message": "max_tokens too large"}}"#;
        assert_eq!(error_message(body.to_string()), "max_tokens too large");
        assert_eq!(error_message("upstream down".to_string()), "upstream down");
    }
}

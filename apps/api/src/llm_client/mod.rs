/// LLM Client: the single point of entry for all model-service calls in the ranker.
///
/// ARCHITECTURAL RULE: pipeline code depends on `CompletionService`, never on `LlmClient`
/// directly. `main` builds one `LlmClient` and hands it out as `Arc<dyn CompletionService>`,
/// which is what lets tests substitute a deterministic stub.
///
/// Each call is a single attempt. Failures are classified and returned to the caller.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub mod prompts;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for all completions.
/// This is intentionally hardcoded to prevent accidental drift between extraction and scoring.
pub const MODEL: &str = "claude-sonnet-4-5";
const DEFAULT_MAX_TOKENS: u32 = 4096;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request timed out")]
    Timeout,

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned empty content")]
    EmptyContent,
}

impl LlmError {
    /// Caller-facing description of the failure. Never includes upstream response bodies.
    pub fn summary(&self) -> &'static str {
        match self {
            LlmError::Timeout => "the language model service timed out",
            LlmError::Http(_) => "the language model service could not be reached",
            LlmError::Api { status: 401 | 403, .. } => {
                "the language model service rejected the configured credentials"
            }
            LlmError::Api { status: 429, .. } => {
                "the language model service quota or rate limit was exceeded"
            }
            LlmError::Api { status, .. } if *status >= 500 => {
                "the language model service is unavailable"
            }
            LlmError::Api { .. } => "the language model service rejected the request",
            LlmError::EmptyContent => "the language model service returned an empty completion",
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, LlmError::Timeout)
    }
}

/// Per-call generation settings.
#[derive(Debug, Clone)]
pub struct CompletionOptions {
    pub system: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionOptions {
    /// Low-randomness settings used by every pipeline call.
    pub fn deterministic(system: &str) -> Self {
        Self {
            system: system.to_string(),
            temperature: 0.0,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// Text generation capability consumed by the ranking pipeline: prompt in, completion out.
///
/// Carried in `AppState` as `Arc<dyn CompletionService>`.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, prompt: &str, options: &CompletionOptions)
        -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// Process-wide model client. Wraps the Anthropic Messages API.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
}

impl LlmClient {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
        })
    }

    /// Makes a raw call to the Messages API, returning the full response object.
    pub async fn call(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<LlmResponse, LlmError> {
        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            system: &options.system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<AnthropicError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let llm_response: LlmResponse = response.json().await.map_err(classify_transport_error)?;

        debug!(
            "LLM call succeeded: input_tokens={}, output_tokens={}",
            llm_response.usage.input_tokens, llm_response.usage.output_tokens
        );

        Ok(llm_response)
    }
}

#[async_trait]
impl CompletionService for LlmClient {
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, LlmError> {
        let response = self.call(prompt, options).await?;
        match response.text() {
            Some(text) if !text.trim().is_empty() => Ok(text.to_string()),
            _ => Err(LlmError::EmptyContent),
        }
    }
}

fn classify_transport_error(err: reqwest::Error) -> LlmError {
    if err.is_timeout() {
        LlmError::Timeout
    } else {
        LlmError::Http(err)
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"criteria\": [\"Rust\"]}\n```";
        assert_eq!(strip_json_fences(input), "{\"criteria\": [\"Rust\"]}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n[\"Rust\"]\n```";
        assert_eq!(strip_json_fences(input), "[\"Rust\"]");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "  {\"criteria\": []}  ";
        assert_eq!(strip_json_fences(input), "{\"criteria\": []}");
    }

    #[test]
    fn test_response_text_picks_first_text_block() {
        let json = r#"{
            "content": [
                {"type": "tool_use", "text": null},
                {"type": "text", "text": "Name: Jane Doe"}
            ],
            "usage": {"input_tokens": 10, "output_tokens": 4}
        }"#;
        let response: LlmResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text(), Some("Name: Jane Doe"));
    }

    #[test]
    fn test_error_summary_hides_upstream_message() {
        let err = LlmError::Api {
            status: 401,
            message: "invalid x-api-key sk-ant-secret".to_string(),
        };
        assert!(!err.summary().contains("sk-ant"));
        assert!(err.summary().contains("credentials"));
    }

    #[test]
    fn test_error_summary_classifies_quota_and_outage() {
        let quota = LlmError::Api {
            status: 429,
            message: String::new(),
        };
        let outage = LlmError::Api {
            status: 529,
            message: String::new(),
        };
        assert!(quota.summary().contains("rate limit"));
        assert!(outage.summary().contains("unavailable"));
        assert!(LlmError::Timeout.is_timeout());
    }

    #[test]
    fn test_deterministic_options_use_zero_temperature() {
        let options = CompletionOptions::deterministic("system");
        assert_eq!(options.temperature, 0.0);
        assert_eq!(options.system, "system");
    }

    #[tokio::test]
    async fn test_stub_records_prompts_and_calls() {
        let stub = testing::StubCompletion::fixed("ok");
        let options = CompletionOptions::deterministic("sys");
        let out = stub.complete("hello", &options).await.unwrap();
        assert_eq!(out, "ok");
        assert_eq!(stub.calls(), 1);
        assert_eq!(stub.prompts(), vec!["hello".to_string()]);
    }
}

//! OpenAI-compatible chat-completions client.
//!
//! Works against any server speaking `/v1/chat/completions` (Ollama,
//! llama.cpp server, vLLM, ...). Non-streaming only.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{ChatRequest, ChatResponse, LlmClient, LlmError};
use crate::config::Config;

/// Local backends ignore the key but the protocol requires one.
const PLACEHOLDER_API_KEY: &str = "ollama";

pub struct OpenAiCompatClient {
    api_base: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct CompletionEnvelope {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatResponse,
}

impl OpenAiCompatClient {
    /// Create a client for `api_base` (e.g. `http://localhost:11434/v1`).
    pub fn new(api_base: impl Into<String>, timeout: Duration) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key: PLACEHOLDER_API_KEY.to_string(),
            client,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        Self::new(config.api_base(), config.timeout)
    }

    /// Use a real API key (hosted OpenAI-compatible endpoints).
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatClient {
    async fn chat_completion(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
        let url = format!("{}/chat/completions", self.api_base);

        tracing::debug!(
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.as_ref().map(|t| t.len()).unwrap_or(0),
            "Calling chat completions"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(classify)?;
        let envelope: CompletionEnvelope = serde_json::from_str(&body)
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

        envelope
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| LlmError::MalformedResponse("response contained no choices".to_string()))
    }
}

fn classify(err: reqwest::Error) -> LlmError {
    if err.is_timeout() {
        LlmError::Timeout
    } else {
        LlmError::Http(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_takes_first_choice_message() {
        let envelope: CompletionEnvelope = serde_json::from_str(
            r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"hello"},"finish_reason":"stop"}]}"#,
        )
        .unwrap();
        assert_eq!(envelope.choices[0].message.content.as_deref(), Some("hello"));
        assert!(envelope.choices[0].message.tool_calls.is_none());
    }

    #[test]
    fn envelope_tolerates_missing_choices() {
        let envelope: CompletionEnvelope = serde_json::from_str(r#"{"id":"x"}"#).unwrap();
        assert!(envelope.choices.is_empty());
    }

    #[test]
    fn new_trims_trailing_slash() {
        let client = OpenAiCompatClient::new("http://localhost:11434/v1/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.api_base, "http://localhost:11434/v1");
    }
}

//! Configuration management for the local agent.
//!
//! Configuration can be set via environment variables:
//! - `OLLAMA_BASE_URL` - Optional. Backend server URL. Defaults to `http://localhost:11434`.
//! - `OLLAMA_AGENT_MODEL` - Optional. Model used by the agent. Defaults to `llama3.1:8b`.
//! - `OLLAMA_TIMEOUT` - Optional. Per-request backend timeout in seconds. Defaults to `120`.
//! - `OLLAMA_TEMPERATURE` - Optional. Sampling temperature. Defaults to `0.1`.
//! - `AGENT_MAX_ITERATIONS` - Optional. Maximum tool-call loops per chat. Defaults to `10`.
//! - `AGENT_MAX_HISTORY` - Optional. Maximum messages kept in history. Defaults to `100`.
//! - `AGENT_MAX_RESULT_LENGTH` - Optional. Maximum characters of a tool result. Defaults to `4000`.
//! - `AGENT_SYSTEM_PROMPT` - Optional. Overrides the built-in system prompt.

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::agent::DEFAULT_SYSTEM_PROMPT;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3.1:8b";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_TEMPERATURE: f32 = 0.1;
pub const DEFAULT_MAX_ITERATIONS: usize = 10;
pub const DEFAULT_MAX_HISTORY: usize = 100;
pub const DEFAULT_MAX_RESULT_LENGTH: usize = 4000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Agent configuration. Fixed once the agent is constructed.
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend server URL (without the `/v1` suffix)
    pub base_url: String,

    /// Model identifier sent with every completion request
    pub model: String,

    /// Timeout applied to each backend request
    pub timeout: Duration,

    /// Sampling temperature
    pub temperature: f32,

    /// Maximum backend calls within a single `chat`
    pub max_iterations: usize,

    /// Maximum number of messages retained in the conversation
    pub max_history: usize,

    /// Maximum characters of a tool result fed back to the model
    pub max_result_length: usize,

    /// System prompt pinned at the head of the conversation
    pub system_prompt: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            temperature: DEFAULT_TEMPERATURE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_history: DEFAULT_MAX_HISTORY,
            max_result_length: DEFAULT_MAX_RESULT_LENGTH,
            system_prompt: Some(DEFAULT_SYSTEM_PROMPT.to_string()),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a numeric variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let base_url = std::env::var("OLLAMA_BASE_URL")
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or(defaults.base_url);

        let model = std::env::var("OLLAMA_AGENT_MODEL").unwrap_or(defaults.model);

        let timeout = Duration::from_secs(parse_env("OLLAMA_TIMEOUT", DEFAULT_TIMEOUT_SECS)?);
        let temperature = parse_env("OLLAMA_TEMPERATURE", DEFAULT_TEMPERATURE)?;
        let max_iterations = parse_env("AGENT_MAX_ITERATIONS", DEFAULT_MAX_ITERATIONS)?;
        let max_history = parse_env("AGENT_MAX_HISTORY", DEFAULT_MAX_HISTORY)?;
        let max_result_length = parse_env("AGENT_MAX_RESULT_LENGTH", DEFAULT_MAX_RESULT_LENGTH)?;

        if max_iterations == 0 {
            return Err(ConfigError::InvalidValue(
                "AGENT_MAX_ITERATIONS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let system_prompt = std::env::var("AGENT_SYSTEM_PROMPT")
            .ok()
            .or(defaults.system_prompt);

        Ok(Self {
            base_url,
            model,
            timeout,
            temperature,
            max_iterations,
            max_history,
            max_result_length,
            system_prompt,
        })
    }

    /// OpenAI-compatible API root of the backend.
    pub fn api_base(&self) -> String {
        format!("{}/v1", self.base_url)
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue(key.to_string(), format!("{}", e))),
        Err(_) => Ok(default),
    }
}

//! Agent-level failures.

use thiserror::Error;

use crate::config::ConfigError;
use crate::llm::LlmError;

/// Failure surfaced by [`Agent`](crate::agent::Agent).
///
/// Tool faults and unknown tools never show up here; they are fed back to
/// the model as tool results.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The backend could not be reached or returned something unusable.
    #[error("LLM call failed: {0}")]
    Completion(#[from] LlmError),

    /// The loop hit its iteration cap without a final answer. `chat`
    /// converts this into a degraded answer instead of returning it.
    #[error("Agent exceeded {limit} iterations")]
    MaxIterations { limit: usize },

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

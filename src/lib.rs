//! # Local Agent
//!
//! A tool-calling agent for local LLM backends.
//!
//! This library provides:
//! - A conversation loop that lets the model call tools until it answers
//! - Structured and free-text tool-call parsing (for models without native tool calling)
//! - An OpenAI-compatible client for Ollama and similar servers
//!
//! ## Architecture
//!
//! The agent follows the "tools in a loop" pattern:
//! 1. Append the user message to the conversation
//! 2. Call the LLM with the conversation and the available tools
//! 3. Execute any tool calls and feed the results back, repeat
//! 4. Return the first plain-text answer, or a degraded answer once the
//!    iteration cap is hit
//!
//! ## Example
//!
//! ```rust,ignore
//! use local_agent::{agent::Agent, config::Config, tools::default_tools};
//!
//! let config = Config::from_env()?;
//! let mut agent = Agent::new(config)?.with_tools(default_tools());
//! let answer = agent.chat("What's new in Rust 1.80?").await?;
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod llm;
pub mod tools;

pub use agent::Agent;
pub use config::Config;
pub use error::AgentError;

//! Agent module - the tool-calling loop.
//!
//! The agent follows a "tools in a loop" pattern:
//! 1. Send the conversation and tool schemas to the LLM
//! 2. If the LLM requests tool calls, execute them and feed the results back
//! 3. Repeat until the LLM produces a plain answer or max iterations is reached

mod agent_loop;
mod conversation;
mod hooks;
mod parse;
mod prompt;

pub use agent_loop::Agent;
pub use conversation::ConversationHistory;
pub use hooks::{AgentHooks, ThinkingHook, ToolEndHook, ToolStartHook};
pub use parse::{decode_arguments, parse_response, ParsedResponse};
pub use prompt::DEFAULT_SYSTEM_PROMPT;

//! Core agent loop implementation.

use std::sync::Arc;

use crate::config::Config;
use crate::error::AgentError;
use crate::llm::{ChatMessage, ChatRequest, LlmClient, OpenAiCompatClient, ToolCall};
use crate::tools::{run_tool, Tool, ToolRegistry};

use super::conversation::ConversationHistory;
use super::hooks::AgentHooks;
use super::parse::{decode_arguments, parse_response, ParsedResponse};

const ITERATION_LIMIT_NOTICE: &str = "\n\n[Stopped: reached maximum tool iterations]";
const NO_ANSWER_MESSAGE: &str = "[Agent reached maximum iterations without producing a final answer. Please try rephrasing your question.]";

/// A chat session that can call tools.
///
/// Owns its tool registry and conversation history. One `chat` runs at a
/// time; backend calls and tool executions are strictly sequential.
pub struct Agent {
    config: Config,
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
    history: ConversationHistory,
    hooks: AgentHooks,
}

impl Agent {
    /// Create an agent talking to the OpenAI-compatible backend in `config`.
    pub fn new(config: Config) -> Result<Self, AgentError> {
        let llm = Arc::new(OpenAiCompatClient::from_config(&config)?);
        Ok(Self::with_client(config, llm))
    }

    /// Create an agent from `OLLAMA_*` and `AGENT_*` environment variables.
    pub fn from_env() -> Result<Self, AgentError> {
        Self::new(Config::from_env()?)
    }

    /// Create an agent with a custom backend.
    pub fn with_client(config: Config, llm: Arc<dyn LlmClient>) -> Self {
        let history =
            ConversationHistory::new(config.system_prompt.as_deref(), config.max_history);

        Self {
            config,
            llm,
            tools: ToolRegistry::new(),
            history,
            hooks: AgentHooks::default(),
        }
    }

    pub fn with_tools(mut self, tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Self {
        for tool in tools {
            self.tools.register(tool);
        }
        self
    }

    pub fn with_hooks(mut self, hooks: AgentHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Register an additional tool.
    pub fn add_tool(&mut self, tool: Arc<dyn Tool>) {
        self.tools.register(tool);
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Send a message and get the final answer, running tools as needed.
    ///
    /// Hitting the iteration cap is not an error: the last assistant answer
    /// (or an explanatory message) is returned with a notice. Backend
    /// failures are returned as [`AgentError::Completion`].
    pub async fn chat(&mut self, message: &str) -> Result<String, AgentError> {
        self.history.add_user(message);

        match self.run_loop().await {
            Ok(answer) => Ok(answer),
            Err(AgentError::MaxIterations { limit }) => {
                tracing::warn!("Agent stopped after {} iterations without a final answer", limit);
                Ok(match self.history.last_assistant_text() {
                    Some(last) => format!("{}{}", last, ITERATION_LIMIT_NOTICE),
                    None => NO_ANSWER_MESSAGE.to_string(),
                })
            }
            Err(e) => {
                tracing::error!("Agent loop failed: {}", e);
                Err(e)
            }
        }
    }

    /// Clear the conversation, keeping the system prompt and tools.
    pub fn reset(&mut self) {
        self.history.clear();
    }

    /// Copy of the conversation so far.
    pub fn get_history(&self) -> Vec<ChatMessage> {
        self.history.snapshot()
    }

    async fn run_loop(&mut self) -> Result<String, AgentError> {
        let max_iterations = self.config.max_iterations;
        // An empty tool list is not the same as offering no tools.
        let tool_schemas = (!self.tools.is_empty()).then(|| self.tools.export_schema());

        for iteration in 0..max_iterations {
            tracing::info!("Agent loop iteration {}/{}", iteration + 1, max_iterations);

            let request = ChatRequest {
                model: self.config.model.clone(),
                messages: self.history.snapshot(),
                temperature: self.config.temperature,
                tools: tool_schemas.clone(),
                stream: false,
            };

            let response = self.llm.chat_completion(&request).await?;

            match parse_response(response) {
                ParsedResponse::StructuredInvocations { calls, text } => {
                    if let Some(text) = text {
                        self.hooks.thinking(&text);
                    }

                    self.history.add_assistant_tool_calls(calls.clone());
                    for call in &calls {
                        self.dispatch(call).await;
                    }
                }
                ParsedResponse::FreeText(content) => {
                    if !content.is_empty() {
                        self.history.add_assistant(content.clone());
                    }
                    return Ok(content.trim().to_string());
                }
            }
        }

        Err(AgentError::MaxIterations {
            limit: max_iterations,
        })
    }

    /// Run one tool call and record its result.
    async fn dispatch(&mut self, call: &ToolCall) {
        let name = call.function.name.as_str();
        let args = decode_arguments(name, &call.function.arguments);

        self.hooks.tool_start(name, &args);

        let result = match self.tools.get(name) {
            Some(tool) => run_tool(tool.as_ref(), args).await,
            None => {
                tracing::warn!("LLM requested unknown tool: {}", name);
                let available: Vec<String> = self
                    .tools
                    .names()
                    .iter()
                    .map(|n| format!("'{}'", n))
                    .collect();
                format!(
                    "Error: Unknown tool '{}'. Available tools: [{}]",
                    name,
                    available.join(", ")
                )
            }
        };

        let result = truncate_result(result, self.config.max_result_length);

        self.hooks.tool_end(name, &result);
        self.history.add_tool_result(call.id.as_str(), name, result);
    }
}

/// Cap a tool result at `max_chars` characters, noting the original length.
fn truncate_result(result: String, max_chars: usize) -> String {
    let total = result.chars().count();
    if total <= max_chars {
        return result;
    }

    let cut = result
        .char_indices()
        .nth(max_chars)
        .map(|(i, _)| i)
        .unwrap_or(result.len());

    format!("{}\n... [truncated, {} chars total]", &result[..cut], total)
}

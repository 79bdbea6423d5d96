//! Optional observer callbacks for host UIs.
//!
//! Hooks run synchronously at fixed points of the loop and cannot affect
//! control flow.

use std::sync::Arc;

use serde_json::Value;

pub type ToolStartHook = Arc<dyn Fn(&str, &Value) + Send + Sync>;
pub type ToolEndHook = Arc<dyn Fn(&str, &str) + Send + Sync>;
pub type ThinkingHook = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Clone, Default)]
pub struct AgentHooks {
    /// Fired before a tool runs, with its name and decoded arguments.
    pub on_tool_start: Option<ToolStartHook>,
    /// Fired after a tool runs, with its name and (truncated) result.
    pub on_tool_end: Option<ToolEndHook>,
    /// Fired with text the model produced alongside tool calls.
    pub on_thinking: Option<ThinkingHook>,
}

impl AgentHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_tool_start(mut self, f: impl Fn(&str, &Value) + Send + Sync + 'static) -> Self {
        self.on_tool_start = Some(Arc::new(f));
        self
    }

    pub fn on_tool_end(mut self, f: impl Fn(&str, &str) + Send + Sync + 'static) -> Self {
        self.on_tool_end = Some(Arc::new(f));
        self
    }

    pub fn on_thinking(mut self, f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_thinking = Some(Arc::new(f));
        self
    }

    pub(crate) fn tool_start(&self, name: &str, args: &Value) {
        if let Some(hook) = &self.on_tool_start {
            hook(name, args);
        }
    }

    pub(crate) fn tool_end(&self, name: &str, result: &str) {
        if let Some(hook) = &self.on_tool_end {
            hook(name, result);
        }
    }

    pub(crate) fn thinking(&self, text: &str) {
        if let Some(hook) = &self.on_thinking {
            hook(text);
        }
    }
}

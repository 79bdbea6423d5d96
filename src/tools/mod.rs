//! Tools the agent can call, and the registry that owns them.
//!
//! A tool reports its name, a description the model reads to decide when
//! to use it, and a JSON Schema for its arguments. Execution faults never
//! escape [`run_tool`]: they come back as an error string the model can
//! react to.

mod web;

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;

use crate::llm::{FunctionSchema, ToolSchema};

pub use web::{ExtractLinks, FetchPage, WebSearch};

/// A capability the model can invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name within a registry.
    fn name(&self) -> &str;

    /// Guidance text the model uses to decide applicability.
    fn description(&self) -> &str;

    /// JSON Schema of the accepted arguments.
    fn parameters_schema(&self) -> Value;

    /// Whether the tool needs a stateful browser session.
    fn requires_browser(&self) -> bool {
        false
    }

    /// Run the tool. A `Value::String` result is passed through as text;
    /// anything else is rendered as JSON.
    async fn execute(&self, args: Value) -> anyhow::Result<Value>;
}

type ToolFn = Arc<dyn Fn(Value) -> BoxFuture<'static, anyhow::Result<Value>> + Send + Sync>;

/// A tool backed by an async closure.
pub struct FnTool {
    name: String,
    description: String,
    parameters: Value,
    requires_browser: bool,
    function: ToolFn,
}

impl FnTool {
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
        function: F,
    ) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            requires_browser: false,
            function: Arc::new(move |args| function(args).boxed()),
        }
    }

    pub fn requiring_browser(mut self) -> Self {
        self.requires_browser = true;
        self
    }
}

#[async_trait]
impl Tool for FnTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> Value {
        self.parameters.clone()
    }

    fn requires_browser(&self) -> bool {
        self.requires_browser
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        (self.function)(args).await
    }
}

/// Describe a tool for the backend's tool-calling protocol.
pub fn tool_schema(tool: &dyn Tool) -> ToolSchema {
    ToolSchema {
        kind: "function".to_string(),
        function: FunctionSchema {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            parameters: tool.parameters_schema(),
        },
    }
}

/// Execute a tool and render its outcome as text.
///
/// Errors, panics and non-object arguments all produce
/// `"Error executing {name}: {message}"`.
pub async fn run_tool(tool: &dyn Tool, args: Value) -> String {
    let name = tool.name();

    if !args.is_object() {
        let message = format!("arguments must be a JSON object, got {}", value_kind(&args));
        tracing::error!("Tool '{}' failed: {}", name, message);
        return format!("Error executing {}: {}", name, message);
    }

    match AssertUnwindSafe(tool.execute(args)).catch_unwind().await {
        Ok(Ok(value)) => render_output(value),
        Ok(Err(e)) => {
            tracing::error!("Tool '{}' failed: {:#}", name, e);
            format!("Error executing {}: {}", name, e)
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            tracing::error!("Tool '{}' panicked: {}", name, message);
            format!("Error executing {}: {}", name, message)
        }
    }
}

fn render_output(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => serde_json::to_string_pretty(&other).unwrap_or_else(|_| other.to_string()),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("tool panicked: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("tool panicked: {}", s)
    } else {
        "tool panicked".to_string()
    }
}

/// Registry of tools, keyed by name, in registration order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. A tool with the same name is replaced in place.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        match self.tools.iter_mut().find(|t| t.name() == name) {
            Some(slot) => *slot = tool,
            None => self.tools.push(tool),
        }
        tracing::info!("Registered tool: {}", name);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.name() == name)
    }

    /// All tools in registration order.
    pub fn list_tools(&self) -> Vec<Arc<dyn Tool>> {
        self.tools.clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name().to_string()).collect()
    }

    /// Schemas for every tool, in registration order.
    pub fn export_schema(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(|t| tool_schema(t.as_ref())).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// The built-in web tools.
pub fn default_tools() -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(WebSearch) as Arc<dyn Tool>,
        Arc::new(FetchPage),
        Arc::new(ExtractLinks),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn echo_tool(name: &str) -> Arc<dyn Tool> {
        Arc::new(FnTool::new(
            name,
            format!("{} tool", name),
            json!({"type": "object", "properties": {}}),
            |args| async move { Ok(args) },
        ))
    }

    #[test]
    fn register_overwrites_in_place() {
        let mut registry = ToolRegistry::new();
        registry.register(echo_tool("a"));
        registry.register(echo_tool("b"));
        registry.register(Arc::new(FnTool::new(
            "a",
            "replacement",
            json!({}),
            |_| async { Ok(Value::Null) },
        )));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["a", "b"]);
        assert_eq!(registry.get("a").unwrap().description(), "replacement");
    }

    #[test]
    fn get_missing_is_none() {
        let registry = ToolRegistry::new();
        assert!(registry.get("nope").is_none());
        assert!(!registry.contains("nope"));
    }

    #[test]
    fn export_schema_follows_registration_order() {
        let mut registry = ToolRegistry::new();
        assert!(registry.export_schema().is_empty());

        registry.register(echo_tool("second"));
        registry.register(echo_tool("first"));
        let schema = registry.export_schema();

        assert_eq!(schema.len(), 2);
        assert_eq!(schema[0].function.name, "second");
        assert_eq!(schema[1].kind, "function");
        assert_eq!(schema[1].function.description, "first tool");
    }

    #[tokio::test]
    async fn text_results_pass_through() {
        let tool = FnTool::new("t", "", json!({}), |_| async { Ok(json!("plain text")) });
        assert_eq!(run_tool(&tool, json!({})).await, "plain text");
    }

    #[tokio::test]
    async fn structured_results_render_as_json() {
        let tool = FnTool::new("t", "", json!({}), |_| async { Ok(json!({"count": 2})) });
        let out = run_tool(&tool, json!({})).await;
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed, json!({"count": 2}));
    }

    #[tokio::test]
    async fn errors_become_diagnostic_strings() {
        let tool = FnTool::new("broken", "", json!({}), |_| async {
            Err(anyhow::anyhow!("disk on fire"))
        });
        assert_eq!(
            run_tool(&tool, json!({})).await,
            "Error executing broken: disk on fire"
        );
    }

    #[tokio::test]
    async fn panics_become_diagnostic_strings() {
        let tool = FnTool::new("panicky", "", json!({}), |_| async {
            if true {
                panic!("boom");
            }
            Ok(Value::Null)
        });
        let out = run_tool(&tool, json!({})).await;
        assert!(out.starts_with("Error executing panicky:"));
        assert!(out.contains("boom"));
    }

    #[test]
    fn non_object_arguments_are_rejected() {
        let tool = FnTool::new("t", "", json!({}), |_| async { Ok(json!("ran")) });
        let out = tokio_test::block_on(run_tool(&tool, json!("query")));
        assert_eq!(
            out,
            "Error executing t: arguments must be a JSON object, got a string"
        );
    }

    #[test]
    fn browser_flag_defaults_off() {
        let tool = FnTool::new("t", "", json!({}), |_| async { Ok(Value::Null) });
        assert!(!tool.requires_browser());
        assert!(tool.requiring_browser().requires_browser());
        assert!(default_tools().iter().all(|t| !t.requires_browser()));
    }
}

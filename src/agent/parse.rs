//! Turning a backend reply into either tool calls or a final answer.
//!
//! Native `tool_calls` win. Models without native tool calling (e.g.
//! llama3.1:8b over some adapters) instead write the call into the text
//! as `{"name": ..., "parameters": {...}}`; that form is recognised as a
//! fallback.

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::llm::{ChatResponse, ToolCall};

/// What the model asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedResponse {
    /// Tools to run, plus any text the model emitted alongside them.
    StructuredInvocations {
        calls: Vec<ToolCall>,
        text: Option<String>,
    },
    /// No tool calls: this is the answer.
    FreeText(String),
}

/// Classify a backend reply. Never fails: anything that is not a
/// recognisable tool call is treated as free text.
pub fn parse_response(response: ChatResponse) -> ParsedResponse {
    let ChatResponse {
        content,
        tool_calls,
    } = response;

    if let Some(mut calls) = tool_calls.filter(|calls| !calls.is_empty()) {
        for call in calls.iter_mut().filter(|c| c.id.is_empty()) {
            call.id = new_call_id();
        }
        let text = content.filter(|c| !c.trim().is_empty());
        return ParsedResponse::StructuredInvocations { calls, text };
    }

    let content = content.unwrap_or_default();
    match parse_text_tool_call(&content) {
        Some(call) => {
            tracing::info!(
                "Parsed text tool call: {} with args {}",
                call.function.name,
                call.function.arguments
            );
            ParsedResponse::StructuredInvocations {
                calls: vec![call],
                text: None,
            }
        }
        None => ParsedResponse::FreeText(content),
    }
}

/// Find an embedded `{"name": .., "parameters"|"arguments": ..}` object,
/// spanning the first `{` to the last `}` of the content.
fn parse_text_tool_call(content: &str) -> Option<ToolCall> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    if end <= start {
        return None;
    }

    let candidate = &content[start..=end];
    let object: Map<String, Value> = match serde_json::from_str(candidate) {
        Ok(object) => object,
        Err(e) => {
            tracing::debug!("Content is not a JSON tool call: {}", e);
            return None;
        }
    };

    // A non-string name cannot match any registered tool.
    let name = object.get("name")?.as_str()?;
    let arguments = object.get("parameters").or_else(|| object.get("arguments"))?;

    // The transport carries arguments as text.
    let arguments = match arguments {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    };

    Some(ToolCall::new(new_call_id(), name, arguments))
}

fn new_call_id() -> String {
    format!("call_{}", Uuid::new_v4().simple())
}

/// Decode text-encoded arguments. Empty or undecodable payloads become an
/// empty object so the call still reaches the tool.
pub fn decode_arguments(tool_name: &str, raw: &str) -> Value {
    if raw.trim().is_empty() {
        return Value::Object(Map::new());
    }

    match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Failed to parse args for {}: {} ({})", tool_name, raw, e);
            Value::Object(Map::new())
        }
    }
}

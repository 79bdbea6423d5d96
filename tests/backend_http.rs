use std::sync::Arc;
use std::time::Duration;

use local_agent::agent::Agent;
use local_agent::config::Config;
use local_agent::llm::{self, ChatMessage, ChatRequest, LlmClient, LlmError, OpenAiCompatClient, Role};
use local_agent::tools::{FnTool, Tool};
use local_agent::AgentError;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn text_body(text: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": text},
            "finish_reason": "stop"
        }]
    })
}

fn tool_body(id: &str, name: &str, args_json: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": id,
                    "type": "function",
                    "function": {"name": name, "arguments": args_json}
                }]
            },
            "finish_reason": "tool_calls"
        }]
    })
}

fn config_for(server: &MockServer) -> Config {
    Config {
        base_url: server.uri(),
        timeout: Duration::from_secs(2),
        ..Config::default()
    }
}

fn request(content: &str) -> ChatRequest {
    ChatRequest {
        model: "llama3.1:8b".to_string(),
        messages: vec![ChatMessage::user(content)],
        temperature: 0.1,
        tools: None,
        stream: false,
    }
}

#[tokio::test]
async fn client_reads_first_choice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer ollama"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_body("Hi!")))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenAiCompatClient::from_config(&config_for(&server)).unwrap();
    let response = client.chat_completion(&request("hello")).await.unwrap();

    assert_eq!(response.content.as_deref(), Some("Hi!"));
    assert!(response.tool_calls.is_none());
}

#[tokio::test]
async fn client_sends_configured_api_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer k"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_body("keyed")))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenAiCompatClient::from_config(&config_for(&server))
        .unwrap()
        .with_api_key("k");
    let response = client.chat_completion(&request("hello")).await.unwrap();

    assert_eq!(response.content.as_deref(), Some("keyed"));
}

#[tokio::test]
async fn client_maps_http_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
        .mount(&server)
        .await;

    let client = OpenAiCompatClient::from_config(&config_for(&server)).unwrap();
    let err = client.chat_completion(&request("hello")).await.unwrap_err();

    match err {
        LlmError::Status { status, body } => {
            assert_eq!(status, 404);
            assert_eq!(body, "model not found");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn client_rejects_empty_choices() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let client = OpenAiCompatClient::from_config(&config_for(&server)).unwrap();
    let err = client.chat_completion(&request("hello")).await.unwrap_err();
    assert!(matches!(err, LlmError::MalformedResponse(_)));
}

#[tokio::test]
async fn client_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(text_body("late"))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let client = OpenAiCompatClient::new(format!("{}/v1", server.uri()), Duration::from_millis(200)).unwrap();
    let err = client.chat_completion(&request("hello")).await.unwrap_err();
    assert!(matches!(err, LlmError::Timeout));
}

#[tokio::test]
async fn agent_runs_tool_round_trip_over_http() {
    let server = MockServer::start().await;

    // Second request carries the tool result.
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("tool_call_id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_body("It is sunny.")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tool_body(
            "call_weather",
            "weather",
            r#"{"city":"Oslo"}"#,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let weather: Arc<dyn Tool> = Arc::new(FnTool::new(
        "weather",
        "Current weather for a city",
        json!({
            "type": "object",
            "properties": {"city": {"type": "string"}},
            "required": ["city"]
        }),
        |args| async move { Ok(json!({"city": args["city"], "sky": "sunny"})) },
    ));

    let mut agent = Agent::new(config_for(&server)).unwrap().with_tools([weather]);
    let answer = agent.chat("Weather in Oslo?").await.unwrap();

    assert_eq!(answer, "It is sunny.");

    let history = agent.get_history();
    let roles: Vec<_> = history.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![Role::System, Role::User, Role::Assistant, Role::Tool, Role::Assistant]
    );
    assert_eq!(history[3].tool_call_id.as_deref(), Some("call_weather"));
    assert!(history[3].content.as_deref().unwrap().contains("sunny"));
}

#[tokio::test]
async fn agent_surfaces_unreachable_backend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let mut agent = Agent::new(config_for(&server)).unwrap();
    let err = agent.chat("hello").await.unwrap_err();

    assert!(matches!(
        err,
        AgentError::Completion(LlmError::Status { status: 500, .. })
    ));
}

#[tokio::test]
async fn health_lists_models() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [{"name": "llama3.1:8b"}, {"name": "phi3:mini"}]
        })))
        .mount(&server)
        .await;

    assert!(llm::check_backend_running(&server.uri()).await);

    let status = llm::health_status(&server.uri()).await;
    assert!(status.backend_running);
    assert!(status.error.is_none());
    assert_eq!(status.models_available, vec!["llama3.1:8b", "phi3:mini"]);
}

#[tokio::test]
async fn health_reports_down_backend() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let status = llm::health_status(&server.uri()).await;
    assert!(!status.backend_running);
    assert!(status.error.is_some());
}

//! Local Agent - interactive chat entry point.
//!
//! Reads messages from stdin and prints the agent's answers. Lines starting
//! with `/` are commands: `/help`, `/clear`, `/tools`, `/history`, `/quit`.

use local_agent::agent::{Agent, AgentHooks};
use local_agent::llm::{self, Role};
use local_agent::tools::default_tools;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const PREVIEW_CHARS: usize = 50;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "local_agent=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let hooks = AgentHooks::new()
        .on_tool_start(|name, args| {
            let summary = args
                .as_object()
                .map(|map| {
                    map.iter()
                        .map(|(k, v)| format!("{}={}", k, preview(&v.to_string(), PREVIEW_CHARS)))
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_default();
            println!("  > {}({})", name, summary);
        })
        .on_tool_end(|name, result| {
            println!("  < {} ({} chars)", name, result.chars().count());
        })
        .on_thinking(|text| println!("  {}", text));

    // Load configuration
    let mut agent = Agent::from_env()?
        .with_tools(default_tools())
        .with_hooks(hooks);

    let config = agent.config();
    info!("Loaded configuration: model={}", config.model);

    let health = llm::health_status(&config.base_url).await;
    if let Some(error) = &health.error {
        warn!("Backend at {} is not healthy: {}", health.base_url, error);
    } else if !health.models_available.contains(&config.model) {
        warn!(
            "Model {} is not installed on the backend (available: {})",
            config.model,
            health.models_available.join(", ")
        );
    }

    println!("Agent chat. Commands: /help, /clear, /tools, /history, /quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"\nyou> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        if input.starts_with('/') {
            if handle_command(input, &mut agent) {
                break;
            }
            continue;
        }

        match agent.chat(input).await {
            Ok(answer) => println!("\nagent> {}", answer),
            Err(e) => println!("\nerror> {}", e),
        }
    }

    Ok(())
}

/// Returns true when the session should end.
fn handle_command(command: &str, agent: &mut Agent) -> bool {
    match command.to_lowercase().as_str() {
        "/quit" | "/exit" | "/q" => {
            println!("Goodbye!");
            return true;
        }
        "/clear" => {
            agent.reset();
            println!("Conversation cleared.");
        }
        "/tools" => {
            for tool in agent.tools().list_tools() {
                println!("  {:<16} {}", tool.name(), tool.description());
            }
        }
        "/history" => {
            for message in agent.get_history() {
                let role = match message.role {
                    Role::System => "system",
                    Role::User => "user",
                    Role::Assistant => "assistant",
                    Role::Tool => "tool",
                };
                let body = match (&message.content, &message.tool_calls) {
                    (_, Some(calls)) => calls
                        .iter()
                        .map(|c| format!("{}({})", c.function.name, c.function.arguments))
                        .collect::<Vec<_>>()
                        .join(", "),
                    (Some(content), None) => preview(content, 100),
                    (None, None) => String::new(),
                };
                println!("  [{}] {}", role, body);
            }
        }
        "/help" => {
            println!("  /clear    reset the conversation");
            println!("  /tools    list available tools");
            println!("  /history  show the conversation");
            println!("  /quit     exit");
        }
        other => println!("Unknown command: {}", other),
    }
    false
}

fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        format!("{}...", flat.chars().take(max_chars).collect::<String>())
    }
}

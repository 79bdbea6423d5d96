//! Backend health probes (Ollama native API).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::LlmError;

const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Snapshot of backend availability.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub backend_running: bool,
    pub base_url: String,
    pub models_available: Vec<String>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

fn tags_url(base_url: &str) -> String {
    format!("{}/api/tags", base_url.trim_end_matches('/'))
}

fn probe_client() -> Result<reqwest::Client, LlmError> {
    Ok(reqwest::Client::builder()
        .timeout(HEALTH_CHECK_TIMEOUT)
        .build()?)
}

/// Whether the backend answers on its model-listing endpoint.
pub async fn check_backend_running(base_url: &str) -> bool {
    let Ok(client) = probe_client() else {
        return false;
    };

    match client.get(tags_url(base_url)).send().await {
        Ok(response) => response.status().is_success(),
        Err(e) => {
            tracing::debug!("Backend probe failed: {}", e);
            false
        }
    }
}

/// Names of the models installed on the backend.
pub async fn available_models(base_url: &str) -> Result<Vec<String>, LlmError> {
    let response = probe_client()?.get(tags_url(base_url)).send().await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(LlmError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let tags: TagsResponse = response
        .json()
        .await
        .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

    Ok(tags.models.into_iter().map(|m| m.name).collect())
}

/// Combined health report; never fails.
pub async fn health_status(base_url: &str) -> HealthStatus {
    let mut status = HealthStatus {
        backend_running: false,
        base_url: base_url.to_string(),
        models_available: Vec::new(),
        error: None,
    };

    status.backend_running = check_backend_running(base_url).await;
    if !status.backend_running {
        status.error = Some("Backend server is not running or unreachable".to_string());
        return status;
    }

    match available_models(base_url).await {
        Ok(models) => status.models_available = models,
        Err(e) => status.error = Some(e.to_string()),
    }

    status
}

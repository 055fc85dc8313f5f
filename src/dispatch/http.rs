use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use crate::config::ApiConfig;
use crate::dispatch::GenerationRequest;
use crate::dispatch::async_poll::TaskSource;
use crate::error::VidshiftError;
use crate::normalize;
use crate::task::{Acknowledged, CreatedTask, RemoteTask, TaskId, TaskStatus};
use crate::validation;

/// Max success body size (4MB). Task payloads carry signed URLs and metadata.
const MAX_RESPONSE_BYTES: usize = 4 * 1024 * 1024;

/// Error bodies only feed a message; anything past this is dropped.
const MAX_ERROR_BODY_BYTES: usize = 64 * 1024;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const ERROR_CODE: &str = "API_ERROR";
const MALFORMED_CODE: &str = "MALFORMED_RESPONSE";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateResponse {
    id: Option<String>,
    status: Option<String>,
    created_at: Option<String>,
    updated_at: Option<String>,
}

/// Client for the video generation service: create, inspect and cancel tasks.
pub struct RunwayClient {
    client: Client,
    base_url: String,
    version: String,
    api_key: Option<String>,
}

impl RunwayClient {
    pub fn new(api: &ApiConfig) -> Result<Self, VidshiftError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| VidshiftError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            version: api.version.clone(),
            api_key: api.api_key.clone(),
        })
    }

    fn task_url(&self, task_id: &str) -> String {
        format!("{}/tasks/{task_id}", self.base_url)
    }

    fn authorized(&self, req: RequestBuilder) -> Result<RequestBuilder, VidshiftError> {
        let key = self.api_key.as_deref().ok_or_else(|| {
            VidshiftError::Config("RUNWAY_API_KEY environment variable is required".to_string())
        })?;
        Ok(req
            .header("Authorization", format!("Bearer {key}"))
            .header("X-Runway-Version", &self.version)
            .header("Content-Type", "application/json")
            .timeout(REQUEST_TIMEOUT))
    }

    /// Validate and submit in one call. Returns the new task's id.
    pub async fn submit(
        &self,
        prompt: &str,
        model: &str,
        ratio: &str,
        video_uri: &str,
        seed: Option<u64>,
    ) -> Result<TaskId, VidshiftError> {
        let request = GenerationRequest::new(prompt, model, ratio, video_uri, seed)?;
        Ok(self.create_task(&request).await?.id)
    }

    /// Issue exactly one creation request. Never retried: a retry could create
    /// a second billable job.
    pub async fn create_task(&self, request: &GenerationRequest) -> Result<CreatedTask, VidshiftError> {
        let url = format!("{}/video_to_video", self.base_url);
        let response = self
            .authorized(self.client.post(&url))?
            .json(&request.to_body())
            .send()
            .await?;

        let bytes = read_success_body(response).await?;
        let parsed: CreateResponse = serde_json::from_slice(&bytes).map_err(|e| {
            malformed(format!("creation response is not valid JSON: {e}"))
        })?;

        let id = parsed
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| malformed("creation response missing 'id'".to_string()))?;

        let now = now_rfc3339();
        let created = CreatedTask {
            id,
            status: parsed
                .status
                .as_deref()
                .map(TaskStatus::from_remote)
                .unwrap_or(TaskStatus::Queued),
            created_at: parsed.created_at.unwrap_or_else(|| now.clone()),
            updated_at: parsed.updated_at.unwrap_or(now),
        };

        tracing::info!(
            task_id = created.id,
            model = request.model(),
            ratio = request.ratio(),
            "generation task created"
        );
        Ok(created)
    }

    /// Raw task payload, exactly as the service returned it.
    pub async fn task_detail(&self, task_id: &str) -> Result<Value, VidshiftError> {
        validation::validate_task_id(task_id)?;
        let response = self
            .authorized(self.client.get(self.task_url(task_id)))?
            .send()
            .await?;

        let bytes = read_success_body(response).await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| malformed(format!("task payload is not valid JSON: {e}")))
    }

    /// One status query, normalized.
    pub async fn get_status(&self, task_id: &str) -> Result<RemoteTask, VidshiftError> {
        let raw = self.task_detail(task_id).await?;
        let mut task = normalize::normalize(&raw);
        if task.id.is_empty() {
            task.id = task_id.to_string();
        }
        Ok(task)
    }

    /// Ask the service to cancel (or delete) a task. The task may still change
    /// state before the service honors it.
    pub async fn cancel_task(&self, task_id: &str) -> Result<Acknowledged, VidshiftError> {
        validation::validate_task_id(task_id)?;
        let response = self
            .authorized(self.client.delete(self.task_url(task_id)))?
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(remote_error(status, response).await);
        }

        tracing::info!(task_id = task_id, "task cancellation acknowledged");
        Ok(Acknowledged { cancelled: true })
    }
}

impl TaskSource for RunwayClient {
    async fn fetch_status(&self, task_id: &str) -> Result<Value, VidshiftError> {
        self.task_detail(task_id).await
    }
}

/// Read a 2xx body under the size cap, or turn a non-2xx response into a remote error.
async fn read_success_body(response: Response) -> Result<Vec<u8>, VidshiftError> {
    let status = response.status();
    if !status.is_success() {
        return Err(remote_error(status, response).await);
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| malformed(format!("failed to read response body: {e}")))?;

    if bytes.len() > MAX_RESPONSE_BYTES {
        return Err(malformed(format!(
            "response too large: {} bytes (max {MAX_RESPONSE_BYTES})",
            bytes.len()
        )));
    }
    Ok(bytes.to_vec())
}

async fn remote_error(status: StatusCode, response: Response) -> VidshiftError {
    let bytes = response.bytes().await.unwrap_or_default();
    let truncated = &bytes[..bytes.len().min(MAX_ERROR_BODY_BYTES)];
    VidshiftError::Remote {
        status: status.as_u16(),
        code: ERROR_CODE.to_string(),
        message: error_message(status, truncated),
    }
}

/// Pull a human-readable message out of an error body: JSON `error`, then JSON
/// `message`, then the raw text, then the status line.
pub fn error_message(status: StatusCode, body: &[u8]) -> String {
    if let Ok(v) = serde_json::from_slice::<Value>(body) {
        let found = ["error", "message"]
            .iter()
            .filter_map(|key| v.get(*key).and_then(Value::as_str))
            .map(str::trim)
            .find(|s| !s.is_empty());
        if let Some(msg) = found {
            return msg.to_string();
        }
        if let Some(msg) = v.pointer("/error/message").and_then(Value::as_str) {
            return msg.to_string();
        }
    } else {
        let text = String::from_utf8_lossy(body);
        let text = text.trim();
        if !text.is_empty() {
            return text.to_string();
        }
    }

    format!(
        "HTTP {} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or_default()
    )
    .trim_end()
    .to_string()
}

fn malformed(message: String) -> VidshiftError {
    VidshiftError::Remote {
        status: StatusCode::BAD_GATEWAY.as_u16(),
        code: MALFORMED_CODE.to_string(),
        message,
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::task::RemoteTask;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GenerateRequest {
    /// Text prompt describing how to transform the video (1-500 characters).
    pub prompt: String,
    /// Public HTTPS URL of the source video. The video service must be able to fetch it.
    pub video_url: String,
    /// Model identifier from `list_options` (defaults to the configured model).
    pub model: Option<String>,
    /// Output aspect ratio as "width:height" from `list_options` (defaults to the configured ratio).
    pub ratio: Option<String>,
    /// Optional seed (0-4294967295) for reproducible output.
    pub seed: Option<u64>,
    /// Block until the task finishes and return its outputs instead of just the task id.
    pub wait: Option<bool>,
}

impl GenerateRequest {
    pub fn model_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(default)
    }

    pub fn ratio_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.ratio
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or(default)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub task_id: String,
    /// Present only when the caller asked to wait for completion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<RemoteTask>,
}

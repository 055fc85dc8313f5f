use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct TaskRequest {
    /// Task id returned by `generate`.
    pub task_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AwaitTaskRequest {
    /// Task id returned by `generate`.
    pub task_id: String,
    /// Milliseconds between status checks (default 3000).
    pub interval_ms: Option<u64>,
    /// Overall polling budget in milliseconds (default 900000 = 15 minutes).
    pub max_duration_ms: Option<u64>,
    /// Stop after this many failed status checks in a row (default 3).
    pub max_consecutive_errors: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelResponse {
    pub cancelled: bool,
    /// True if an `await_task` call in this server was polling the task and has been stopped.
    pub stopped_local_polling: bool,
}

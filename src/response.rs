use rmcp::model::{CallToolResult, Content};
use serde::Serialize;

use crate::error::VidshiftError;

/// JSON envelope returned by every tool.
/// All tools return Content::text(json_string) so UIs parse a single shape.
#[derive(Debug, Serialize)]
pub struct ToolResponse {
    pub status: &'static str,
    pub content: String,
    pub content_type: &'static str,
    pub metadata: ToolMetadata,
}

#[derive(Debug, Serialize)]
pub struct ToolMetadata {
    pub tool_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    /// Machine label for errors (`permanent`, `service`, `timed_out`, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    /// False tells a UI to stop spinning: repeating the call will not help.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
    #[serde(serialize_with = "serialize_finite_f64")]
    pub duration_seconds: f64,
}

impl ToolMetadata {
    pub fn new(tool_name: &str, task_id: Option<&str>, duration_seconds: f64) -> Self {
        Self {
            tool_name: tool_name.to_string(),
            task_id: task_id.map(str::to_string),
            error_kind: None,
            retryable: None,
            duration_seconds,
        }
    }
}

/// Serialize f64, clamping non-finite values (NaN, Inf) to 0.0.
fn serialize_finite_f64<S: serde::Serializer>(v: &f64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(if v.is_finite() { *v } else { 0.0 })
}

impl ToolResponse {
    /// Success with a JSON payload.
    pub fn success<T: Serialize>(payload: &T, metadata: ToolMetadata) -> Self {
        match serde_json::to_string(payload) {
            Ok(content) => Self {
                status: "success",
                content,
                content_type: "json",
                metadata,
            },
            Err(e) => Self {
                status: "error",
                content: format!("serialization failed: {e}"),
                content_type: "text",
                metadata,
            },
        }
    }

    pub fn error(err: &VidshiftError, mut metadata: ToolMetadata) -> Self {
        metadata.error_kind = Some(err.kind());
        metadata.retryable = Some(err.is_retryable());
        Self {
            status: "error",
            content: err.user_message(),
            content_type: "text",
            metadata,
        }
    }

    /// Build from an operation result, logging failures.
    pub fn from_result<T: Serialize>(
        result: Result<T, VidshiftError>,
        metadata: ToolMetadata,
    ) -> Self {
        match result {
            Ok(payload) => Self::success(&payload, metadata),
            Err(e) => {
                tracing::warn!(
                    tool = metadata.tool_name,
                    kind = e.kind(),
                    "tool call failed: {e}"
                );
                Self::error(&e, metadata)
            }
        }
    }

    /// Convert to MCP CallToolResult.
    /// Always returns success at the MCP transport level; error info is in the JSON
    /// payload (`"status": "error"`).
    pub fn into_call_tool_result(self) -> CallToolResult {
        match serde_json::to_string(&self) {
            Ok(json) => CallToolResult::success(vec![Content::text(json)]),
            Err(e) => {
                let escaped = e.to_string().replace('\\', "\\\\").replace('"', "\\\"");
                CallToolResult::success(vec![Content::text(format!(
                    r#"{{"status":"error","content":"serialization failed: {escaped}","content_type":"text","metadata":{{}}}}"#
                ))])
            }
        }
    }
}

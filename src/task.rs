use serde::{Deserialize, Serialize};

/// Opaque identifier assigned by the video service.
pub type TaskId = String;

/// Canonical task status after normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
}

impl TaskStatus {
    /// Map a service-specific status word onto the canonical set.
    /// Unknown words map to `Running` so they are never mistaken for an outcome.
    pub fn from_remote(raw: &str) -> Self {
        match raw.trim().to_uppercase().as_str() {
            "QUEUED" => Self::Queued,
            "RUNNING" => Self::Running,
            "SUCCEEDED" | "COMPLETED" | "SUCCESS" => Self::Succeeded,
            "FAILED" | "ERROR" => Self::Failed,
            _ => Self::Running,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "QUEUED",
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Position in the lifecycle. Terminal states share the top rank.
    fn rank(&self) -> u8 {
        match self {
            Self::Queued => 0,
            Self::Running => 1,
            Self::Succeeded | Self::Failed => 2,
        }
    }

    /// The status to report after observing `next` when `self` was seen last.
    /// A task that has started running never goes back to queued.
    pub fn advance(self, next: Self) -> Self {
        if next.rank() < self.rank() { self } else { next }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One generation job as reported by the video service, in canonical shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteTask {
    pub id: TaskId,
    pub status: TaskStatus,
    /// Output URLs in remote order. Only populated when `status` is `Succeeded`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_position: Option<u64>,
    /// Only populated when `status` is `Failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Acknowledgement returned by the creation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedTask {
    pub id: TaskId,
    pub status: TaskStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// Acknowledgement of a cancellation request. Says nothing about the task's final state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Acknowledged {
    pub cancelled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synonyms_map_to_canonical() {
        assert_eq!(TaskStatus::from_remote("completed"), TaskStatus::Succeeded);
        assert_eq!(TaskStatus::from_remote("Success"), TaskStatus::Succeeded);
        assert_eq!(TaskStatus::from_remote("ERROR"), TaskStatus::Failed);
        assert_eq!(TaskStatus::from_remote(" queued "), TaskStatus::Queued);
    }

    #[test]
    fn unknown_status_is_running() {
        assert_eq!(TaskStatus::from_remote("THROTTLED"), TaskStatus::Running);
        assert_eq!(TaskStatus::from_remote(""), TaskStatus::Running);
        assert_eq!(TaskStatus::from_remote("PENDING"), TaskStatus::Running);
    }

    #[test]
    fn advance_never_regresses_to_queued() {
        assert_eq!(
            TaskStatus::Running.advance(TaskStatus::Queued),
            TaskStatus::Running
        );
        assert_eq!(
            TaskStatus::Queued.advance(TaskStatus::Running),
            TaskStatus::Running
        );
        assert_eq!(
            TaskStatus::Running.advance(TaskStatus::Failed),
            TaskStatus::Failed
        );
    }

    #[test]
    fn remote_task_serializes_camel_case_and_skips_absent() {
        let task = RemoteTask {
            id: "t1".to_string(),
            status: TaskStatus::Running,
            outputs: vec![],
            progress: Some(42.0),
            queue_position: None,
            error: None,
            created_at: "2024-01-01T00:00:00Z".to_string(),
            updated_at: String::new(),
        };
        let v = serde_json::to_value(&task).unwrap();
        assert_eq!(v["status"], "RUNNING");
        assert_eq!(v["progress"], 42.0);
        assert_eq!(v["createdAt"], "2024-01-01T00:00:00Z");
        assert!(v.get("outputs").is_none());
        assert!(v.get("queuePosition").is_none());
        assert!(v.get("error").is_none());
    }
}

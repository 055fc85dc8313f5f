use thiserror::Error;

/// HTTP statuses that mean the request itself can never succeed.
const PERMANENT_STATUSES: [u16; 4] = [400, 401, 403, 404];

#[derive(Debug, Error)]
pub enum VidshiftError {
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("remote service error (HTTP {status}, {code}): {message}")]
    Remote {
        status: u16,
        code: String,
        message: String,
    },

    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("polling task {task_id} timed out after {attempts} attempts")]
    PollTimeout { task_id: String, attempts: u32 },

    #[error("polling task {task_id} stopped after {consecutive_errors} consecutive errors: {last_error}")]
    PollErrorBudgetExhausted {
        task_id: String,
        consecutive_errors: u32,
        last_error: String,
    },

    #[error("polling task {task_id} was cancelled")]
    PollCancelled { task_id: String },

    #[error("task {task_id} failed: {message}")]
    TaskFailed { task_id: String, message: String },

    #[error("task {task_id} succeeded without output")]
    NoOutput { task_id: String },
}

impl VidshiftError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// HTTP status reported by the remote service, if the error came from one.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Remote { status, .. } => Some(*status),
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// True for 400/401/403/404: polling a task that answers with one of these is doomed.
    pub fn is_permanent(&self) -> bool {
        self.http_status()
            .is_some_and(|s| PERMANENT_STATUSES.contains(&s))
    }

    /// True when a caller may reasonably try the same operation again later.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Remote { status, .. } => *status >= 500 || *status == 429,
            Self::Request(_) => !self.is_permanent(),
            // The remote task may still be running; only the local budget ran out.
            Self::PollTimeout { .. } => true,
            Self::PollErrorBudgetExhausted { .. } => true,
            _ => false,
        }
    }

    /// Stable machine-readable label for UIs and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::Remote { .. } if self.is_permanent() => "permanent",
            Self::Remote { status, .. } if *status >= 500 => "service",
            Self::Remote { .. } => "request",
            Self::Request(_) => "transport",
            Self::Config(_) => "config",
            Self::PollTimeout { .. } => "timed_out",
            Self::PollErrorBudgetExhausted { .. } => "error_budget_exhausted",
            Self::PollCancelled { .. } => "cancelled",
            Self::TaskFailed { .. } => "failed",
            Self::NoOutput { .. } => "no_output",
        }
    }

    /// Produce a sanitized error message safe for returning to callers.
    /// Transport errors are summarized so connection details and URLs stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { field, message } => format!("invalid {field}: {message}"),
            Self::Remote {
                status, message, ..
            } => {
                if *status >= 500 {
                    format!("video service error (HTTP {status}): {message}")
                } else if self.is_permanent() {
                    format!("permanent error (HTTP {status}): {message}")
                } else {
                    format!("request rejected (HTTP {status}): {message}")
                }
            }
            Self::Request(_) => "request to video service failed".to_string(),
            Self::Config(msg) => format!("server misconfigured: {msg}"),
            Self::PollTimeout { .. } => "task polling timed out".to_string(),
            Self::PollErrorBudgetExhausted { .. } => {
                "too many consecutive errors while checking task status; stopped polling"
                    .to_string()
            }
            Self::PollCancelled { .. } => "task cancelled".to_string(),
            Self::TaskFailed { message, .. } => message.clone(),
            Self::NoOutput { .. } => "generation completed but no output received".to_string(),
        }
    }
}

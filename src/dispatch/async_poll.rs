use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::error::VidshiftError;
use crate::normalize;
use crate::task::{RemoteTask, TaskStatus};

pub const DEFAULT_INTERVAL_MS: u64 = 3_000;

/// 15 minutes.
pub const DEFAULT_MAX_DURATION_MS: u64 = 15 * 60 * 1_000;

/// Circuit breaker: stop after this many failed status queries in a row.
pub const DEFAULT_MAX_CONSECUTIVE_ERRORS: u32 = 3;

/// Message used when the service reports a failure without saying why.
pub const GENERIC_FAILURE_MESSAGE: &str = "Video generation failed";

/// Timing and error budgets for one poll session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    interval: Duration,
    max_duration: Duration,
    max_consecutive_errors: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_INTERVAL_MS),
            max_duration: Duration::from_millis(DEFAULT_MAX_DURATION_MS),
            max_consecutive_errors: DEFAULT_MAX_CONSECUTIVE_ERRORS,
        }
    }
}

impl PollPolicy {
    pub fn new(
        interval: Duration,
        max_duration: Duration,
        max_consecutive_errors: u32,
    ) -> Result<Self, VidshiftError> {
        if interval.as_millis() == 0 {
            return Err(VidshiftError::validation(
                "interval_ms",
                "poll interval must be at least 1ms",
            ));
        }
        if max_duration.is_zero() {
            return Err(VidshiftError::validation(
                "max_duration_ms",
                "poll duration must be positive",
            ));
        }
        if max_consecutive_errors == 0 {
            return Err(VidshiftError::validation(
                "max_consecutive_errors",
                "error budget must be at least 1",
            ));
        }
        Ok(Self {
            interval,
            max_duration,
            max_consecutive_errors,
        })
    }

    /// Replace individual fields, re-validating the result.
    pub fn with_overrides(
        &self,
        interval_ms: Option<u64>,
        max_duration_ms: Option<u64>,
        max_consecutive_errors: Option<u32>,
    ) -> Result<Self, VidshiftError> {
        Self::new(
            interval_ms.map_or(self.interval, Duration::from_millis),
            max_duration_ms.map_or(self.max_duration, Duration::from_millis),
            max_consecutive_errors.unwrap_or(self.max_consecutive_errors),
        )
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn max_duration(&self) -> Duration {
        self.max_duration
    }

    pub fn max_consecutive_errors(&self) -> u32 {
        self.max_consecutive_errors
    }

    /// `ceil(max_duration / interval)`, saturating at `u32::MAX`.
    pub fn max_attempts(&self) -> u32 {
        let interval = self.interval.as_millis();
        let total = self.max_duration.as_millis();
        u32::try_from(total.div_ceil(interval)).unwrap_or(u32::MAX)
    }
}

/// Source of raw task payloads. The production implementation is the HTTP client;
/// tests script it.
pub trait TaskSource: Send + Sync {
    fn fetch_status(
        &self,
        task_id: &str,
    ) -> impl Future<Output = Result<serde_json::Value, VidshiftError>> + Send;
}

impl<S: TaskSource> TaskSource for Arc<S> {
    fn fetch_status(
        &self,
        task_id: &str,
    ) -> impl Future<Output = Result<serde_json::Value, VidshiftError>> + Send {
        (**self).fetch_status(task_id)
    }
}

impl<S: TaskSource + ?Sized> TaskSource for &S {
    fn fetch_status(
        &self,
        task_id: &str,
    ) -> impl Future<Output = Result<serde_json::Value, VidshiftError>> + Send {
        (**self).fetch_status(task_id)
    }
}

/// The only suspension point of a poll session. Injected so tests never wait on a real clock.
pub trait Ticker: Send + Sync {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// Wall-clock ticker backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTicker;

impl Ticker for TokioTicker {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

impl<T: Ticker + ?Sized> Ticker for &T {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        (**self).sleep(duration)
    }
}

/// Why a session ended in failure.
#[derive(Debug)]
pub enum FailureReason {
    /// The service reported the task as failed.
    Remote { task: RemoteTask, message: String },
    /// The service reported success but listed no output URLs.
    NoOutput { task: RemoteTask },
    /// A status query came back 400/401/403/404; retrying cannot help.
    Permanent(VidshiftError),
}

/// How a poll session ended.
#[derive(Debug)]
pub enum TerminalOutcome {
    Succeeded(RemoteTask),
    Failed(FailureReason),
    TimedOut { attempts: u32 },
    ErrorBudgetExhausted {
        consecutive_errors: u32,
        last_error: String,
    },
    Cancelled,
}

impl TerminalOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Succeeded(_) => "succeeded",
            Self::Failed(FailureReason::Remote { .. }) => "failed",
            Self::Failed(FailureReason::NoOutput { .. }) => "no_output",
            Self::Failed(FailureReason::Permanent(_)) => "permanent",
            Self::TimedOut { .. } => "timed_out",
            Self::ErrorBudgetExhausted { .. } => "error_budget_exhausted",
            Self::Cancelled => "cancelled",
        }
    }

    /// Collapse into the caller-facing result: the finished task or a typed error.
    pub fn into_result(self, task_id: &str) -> Result<RemoteTask, VidshiftError> {
        let task_id = task_id.to_string();
        match self {
            Self::Succeeded(task) => Ok(task),
            Self::Failed(FailureReason::Remote { message, .. }) => {
                Err(VidshiftError::TaskFailed { task_id, message })
            }
            Self::Failed(FailureReason::NoOutput { .. }) => Err(VidshiftError::NoOutput { task_id }),
            Self::Failed(FailureReason::Permanent(e)) => Err(e),
            Self::TimedOut { attempts } => Err(VidshiftError::PollTimeout { task_id, attempts }),
            Self::ErrorBudgetExhausted {
                consecutive_errors,
                last_error,
            } => Err(VidshiftError::PollErrorBudgetExhausted {
                task_id,
                consecutive_errors,
                last_error,
            }),
            Self::Cancelled => Err(VidshiftError::PollCancelled { task_id }),
        }
    }
}

/// Result of one step of the state machine.
#[derive(Debug)]
pub enum PollState {
    /// Not done yet; wait one interval and step again.
    Polling,
    Terminal(TerminalOutcome),
}

/// Caller-owned counters for one outstanding task. Not shared between sessions.
#[derive(Debug, Clone)]
pub struct PollSession {
    pub task_id: String,
    pub attempts_used: u32,
    pub consecutive_errors: u32,
    pub started_at: Instant,
    /// Highest lifecycle status seen so far; later reports never move it backwards.
    pub last_status: Option<TaskStatus>,
    pub last_error: Option<String>,
}

impl PollSession {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            attempts_used: 0,
            consecutive_errors: 0,
            started_at: Instant::now(),
            last_status: None,
            last_error: None,
        }
    }
}

/// Tracks one remote task to a terminal outcome, one status query at a time.
pub struct Poller<S, T = TokioTicker> {
    source: S,
    ticker: T,
    policy: PollPolicy,
}

impl<S: TaskSource> Poller<S, TokioTicker> {
    pub fn new(source: S, policy: PollPolicy) -> Self {
        Self::with_ticker(source, TokioTicker, policy)
    }
}

impl<S: TaskSource, T: Ticker> Poller<S, T> {
    pub fn with_ticker(source: S, ticker: T, policy: PollPolicy) -> Self {
        Self {
            source,
            ticker,
            policy,
        }
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Run one transition: budget checks, one status query, and the decision it drives.
    pub async fn step(&self, session: &mut PollSession) -> PollState {
        let max_attempts = self.policy.max_attempts();
        let max_errors = self.policy.max_consecutive_errors;

        if session.attempts_used >= max_attempts {
            return PollState::Terminal(TerminalOutcome::TimedOut {
                attempts: session.attempts_used,
            });
        }
        if session.consecutive_errors >= max_errors {
            return PollState::Terminal(self.error_budget_outcome(session));
        }

        match self.source.fetch_status(&session.task_id).await {
            Err(e) if e.is_permanent() => {
                tracing::warn!(
                    task_id = session.task_id,
                    attempt = session.attempts_used + 1,
                    "permanent error while polling: {e}"
                );
                PollState::Terminal(TerminalOutcome::Failed(FailureReason::Permanent(e)))
            }
            Err(e) => {
                session.attempts_used += 1;
                session.consecutive_errors += 1;
                session.last_error = Some(e.to_string());
                tracing::warn!(
                    task_id = session.task_id,
                    attempt = session.attempts_used,
                    consecutive_errors = session.consecutive_errors,
                    "status query failed: {e}"
                );

                if session.consecutive_errors >= max_errors {
                    PollState::Terminal(self.error_budget_outcome(session))
                } else if session.attempts_used >= max_attempts {
                    PollState::Terminal(TerminalOutcome::TimedOut {
                        attempts: session.attempts_used,
                    })
                } else {
                    PollState::Polling
                }
            }
            Ok(raw) => {
                session.consecutive_errors = 0;
                let mut task = normalize::normalize(&raw);
                if task.id.is_empty() {
                    task.id = session.task_id.clone();
                }
                if let Some(previous) = session.last_status {
                    task.status = previous.advance(task.status);
                }
                session.last_status = Some(task.status);

                match task.status {
                    TaskStatus::Succeeded if task.outputs.is_empty() => {
                        PollState::Terminal(TerminalOutcome::Failed(FailureReason::NoOutput {
                            task,
                        }))
                    }
                    TaskStatus::Succeeded => PollState::Terminal(TerminalOutcome::Succeeded(task)),
                    TaskStatus::Failed => {
                        let message = task
                            .error
                            .clone()
                            .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string());
                        PollState::Terminal(TerminalOutcome::Failed(FailureReason::Remote {
                            task,
                            message,
                        }))
                    }
                    TaskStatus::Queued | TaskStatus::Running => {
                        session.attempts_used += 1;
                        tracing::debug!(
                            task_id = session.task_id,
                            attempt = session.attempts_used,
                            status = %task.status,
                            progress = task.progress,
                            queue_position = task.queue_position,
                            "task not finished"
                        );
                        if session.attempts_used >= max_attempts {
                            PollState::Terminal(TerminalOutcome::TimedOut {
                                attempts: session.attempts_used,
                            })
                        } else {
                            PollState::Polling
                        }
                    }
                }
            }
        }
    }

    /// Poll until a terminal outcome. Cancelling `cancel` skips the next attempt;
    /// a query already in flight is allowed to finish and its result is discarded.
    pub async fn poll_until_terminal(
        &self,
        task_id: &str,
        cancel: &CancellationToken,
    ) -> TerminalOutcome {
        let mut session = PollSession::new(task_id);
        let outcome = self.run(&mut session, cancel).await;

        tracing::info!(
            task_id = session.task_id,
            outcome = outcome.label(),
            attempts = session.attempts_used,
            elapsed_ms = session.started_at.elapsed().as_millis() as u64,
            "poll session finished"
        );
        outcome
    }

    /// Drive an existing session to completion.
    pub async fn run(&self, session: &mut PollSession, cancel: &CancellationToken) -> TerminalOutcome {
        loop {
            if cancel.is_cancelled() {
                return TerminalOutcome::Cancelled;
            }

            let state = self.step(session).await;

            if cancel.is_cancelled() {
                return TerminalOutcome::Cancelled;
            }

            match state {
                PollState::Terminal(outcome) => return outcome,
                PollState::Polling => {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return TerminalOutcome::Cancelled,
                        _ = self.ticker.sleep(self.policy.interval) => {}
                    }
                }
            }
        }
    }

    fn error_budget_outcome(&self, session: &PollSession) -> TerminalOutcome {
        TerminalOutcome::ErrorBudgetExhausted {
            consecutive_errors: session.consecutive_errors,
            last_error: session
                .last_error
                .clone()
                .unwrap_or_else(|| "unknown error".to_string()),
        }
    }
}
